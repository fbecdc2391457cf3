//! The compiled form of a constraint and of its negation must partition the
//! structurally valid workflows: for every workflow exactly one of the two
//! is satisfiable, and the satisfiable one agrees with direct evaluation.

mod common;

use proptest::prelude::*;
use synthflow_ir::formula::Formula;
use synthflow_ir::proptest_generators::arb_closed_formula;
use synthflow_ir::taxonomy::EMPTY_TYPE_SUFFIX;

use common::{assert_negation_duality, branching_domain};

fn predicates() -> (Vec<usize>, Vec<usize>) {
    let domain = branching_domain();
    let tax = &domain.taxonomy;
    let id = |label: &str| tax.lookup(label).unwrap();
    let operations = ["A", "B", "C", "Convert", "Operation"].map(id).to_vec();
    let empty = format!("Data{EMPTY_TYPE_SUFFIX}");
    let types = vec![id("X"), id("Y"), id("Seq"), id("Data"), id(&empty)];
    (operations, types)
}

#[test]
fn operation_atoms_and_classes() {
    let domain = branching_domain();
    let id = |label: &str| domain.taxonomy.lookup(label).unwrap();
    for f in [
        Formula::operation(id("A")),
        Formula::operation(id("Convert")),
        Formula::operation(id("C")).next(),
        Formula::operation(id("Convert")).globally(),
        Formula::operation(id("C")).finally(),
        Formula::operation(id("A")).implies(Formula::operation(id("B")).next()),
    ] {
        assert_negation_duality(&domain, 2, &f);
    }
}

#[test]
fn quantified_data_properties() {
    let domain = branching_domain();
    let id = |label: &str| domain.taxonomy.lookup(label).unwrap();
    for f in [
        Formula::exists("x", Formula::has_type("x", id("Y"))),
        Formula::exists("x", Formula::has_type("x", id("Seq"))).next(),
        Formula::forall("x", Formula::has_type("x", id("X"))),
        Formula::exists(
            "x",
            Formula::and(vec![Formula::produces("x"), Formula::has_type("x", id("Y"))]),
        )
        .finally(),
        Formula::exists("x", Formula::consumes("x").next()),
        Formula::forall(
            "x",
            Formula::forall("y", Formula::identical("x", "y")),
        ),
        Formula::exists("x", Formula::exists("y", Formula::identical("x", "y").not())),
    ] {
        assert_negation_duality(&domain, 2, &f);
    }
}

#[test]
fn connectives_over_mixed_atoms() {
    let domain = branching_domain();
    let id = |label: &str| domain.taxonomy.lookup(label).unwrap();
    let produced_y = Formula::exists(
        "x",
        Formula::and(vec![Formula::produces("x"), Formula::has_type("x", id("Y"))]),
    );
    for f in [
        Formula::operation(id("A")).iff(produced_y.clone()),
        Formula::operation(id("C")).xor(produced_y.clone().next()),
        Formula::or(vec![Formula::falsity(), produced_y.clone().not()]),
        produced_y.globally().not(),
    ] {
        assert_negation_duality(&domain, 2, &f);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn random_closed_formulas(f in {
        let (ops, types) = predicates();
        arb_closed_formula(ops, types, 2)
    }) {
        assert_negation_duality(&branching_domain(), 2, &f);
    }
}
