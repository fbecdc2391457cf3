//! Quantifiers only see data produced up to and including the current step.

mod common;

use synthflow_ir::automaton::Automaton;
use synthflow_ir::formula::Formula;
use synthflow_smt::arena::EncodingArena;
use synthflow_smt::compiler::FormulaCompiler;
use synthflow_smt::encoder::{encode_workflow, EncodingPolicy};
use synthflow_smt::solver::SatResult;

use common::{chain_domain, solve};

fn check(formula: &Formula) -> SatResult {
    let domain = chain_domain();
    let automaton = Automaton::for_domain(&domain, 2).unwrap();
    let mut arena = EncodingArena::new();
    let mut cnf = encode_workflow(&domain, &automaton, &mut arena, &EncodingPolicy::default())
        .unwrap()
        .formula;
    let mut compiler = FormulaCompiler::new(&domain.taxonomy, &automaton, &mut arena);
    let clauses = compiler
        .compile_constraints(std::slice::from_ref(formula))
        .unwrap();
    cnf.extend(clauses);
    solve(&cnf).0
}

#[test]
fn structure_alone_is_satisfiable() {
    assert_eq!(check(&Formula::truth()), SatResult::Sat);
}

#[test]
fn data_of_the_last_step_is_invisible_at_the_first() {
    let z = chain_domain().taxonomy.lookup("Z").unwrap();
    let f = Formula::exists("x", Formula::has_type("x", z));
    assert_eq!(check(&f), SatResult::Unsat);
}

#[test]
fn data_of_the_last_step_is_visible_one_step_later() {
    let z = chain_domain().taxonomy.lookup("Z").unwrap();
    let f = Formula::exists("x", Formula::has_type("x", z)).next();
    assert_eq!(check(&f), SatResult::Sat);
}

#[test]
fn intermediate_data_is_visible_where_it_is_produced() {
    let y = chain_domain().taxonomy.lookup("Y").unwrap();
    let f = Formula::exists(
        "x",
        Formula::and(vec![Formula::produces("x"), Formula::has_type("x", y)]),
    );
    assert_eq!(check(&f), SatResult::Sat);
    assert_eq!(check(&f.clone().next()), SatResult::Unsat);
}

#[test]
fn the_first_operation_consumes_a_workflow_input() {
    let x = chain_domain().taxonomy.lookup("X").unwrap();
    let consumed_x = Formula::exists(
        "v",
        Formula::and(vec![Formula::consumes("v"), Formula::has_type("v", x)]),
    );
    assert_eq!(check(&consumed_x), SatResult::Sat);
    assert_eq!(check(&consumed_x.not()), SatResult::Unsat);
}
