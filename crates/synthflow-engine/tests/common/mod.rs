#![allow(dead_code)]

use synthflow_engine::solution::{blocking_clause, decode_solution, BlockingPolicy, Solution};
use synthflow_engine::SynthesisOptions;
use synthflow_ir::automaton::Automaton;
use synthflow_ir::domain::SynthesisDomain;
use synthflow_ir::taxonomy::TaxonomyBuilder;
use synthflow_smt::arena::EncodingArena;
use synthflow_smt::backends::batsat::BatsatSolver;
use synthflow_smt::encoder::{encode_workflow, EncodingPolicy, UsagePolicy};
use synthflow_smt::solver::{Model, SatResult, SatSolver};

/// A: X -> Y, B: Y -> Z; workflow X to Z.
pub fn chain_domain() -> SynthesisDomain {
    let mut b = TaxonomyBuilder::new();
    b.operation_root("Operation").unwrap();
    b.add_dimension("Data").unwrap();
    for t in ["X", "Y", "Z"] {
        b.add_type(t, "Data").unwrap();
    }
    b.add_operation("A", "Operation", &[&["X"]], &[&["Y"]])
        .unwrap();
    b.add_operation("B", "Operation", &[&["Y"]], &[&["Z"]])
        .unwrap();
    SynthesisDomain::new(b.build().unwrap())
        .with_inputs(&[&["X"]])
        .unwrap()
        .with_outputs(&[&["Z"]])
        .unwrap()
}

/// Three interchangeable X -> X operations, no workflow outputs.
pub fn loop_domain() -> SynthesisDomain {
    let mut b = TaxonomyBuilder::new();
    b.operation_root("Operation").unwrap();
    b.add_dimension("Data").unwrap();
    b.add_type("X", "Data").unwrap();
    for op in ["A", "B", "C"] {
        b.add_operation(op, "Operation", &[&["X"]], &[&["X"]])
            .unwrap();
    }
    SynthesisDomain::new(b.build().unwrap())
        .with_inputs(&[&["X"]])
        .unwrap()
}

/// Join: (X, X) -> Y and Split: X -> (Y, Y); workflow X to Y.
pub fn join_split_domain() -> SynthesisDomain {
    let mut b = TaxonomyBuilder::new();
    b.operation_root("Operation").unwrap();
    b.add_dimension("Data").unwrap();
    b.add_type("X", "Data").unwrap();
    b.add_type("Y", "Data").unwrap();
    b.add_operation("Join", "Operation", &[&["X"], &["X"]], &[&["Y"]])
        .unwrap();
    b.add_operation("Split", "Operation", &[&["X"]], &[&["Y"], &["Y"]])
        .unwrap();
    SynthesisDomain::new(b.build().unwrap())
        .with_inputs(&[&["X"]])
        .unwrap()
        .with_outputs(&[&["Y"]])
        .unwrap()
}

/// Two dimensions, abstract types and operation classes, multi-slot
/// operations.
pub fn bio_domain() -> SynthesisDomain {
    let mut b = TaxonomyBuilder::new();
    b.operation_root("Operation").unwrap();
    b.add_operation_class("Transform", "Operation").unwrap();
    b.add_operation_class("Analysis", "Operation").unwrap();
    b.add_dimension("Data").unwrap();
    b.add_type("Seq", "Data").unwrap();
    b.add_type("DNA", "Seq").unwrap();
    b.add_type("Protein", "Seq").unwrap();
    b.add_type("Text", "Data").unwrap();
    b.add_dimension("Format").unwrap();
    b.add_type("FASTA", "Format").unwrap();
    b.add_type("Plain", "Format").unwrap();
    b.add_operation(
        "Translate",
        "Transform",
        &[&["DNA", "FASTA"]],
        &[&["Protein", "FASTA"]],
    )
    .unwrap();
    b.add_operation("Reformat", "Transform", &[&["Seq"]], &[&["Seq", "Plain"]])
        .unwrap();
    b.add_operation("Report", "Analysis", &[&["Protein"], &["Text"]], &[&["Text"]])
        .unwrap();
    SynthesisDomain::new(b.build().unwrap())
        .with_inputs(&[&["DNA", "FASTA"], &["Text", "Plain"]])
        .unwrap()
        .with_outputs(&[&["Text"]])
        .unwrap()
}

pub fn options(min: usize, max: usize, count: usize) -> SynthesisOptions {
    SynthesisOptions {
        min_length: min,
        max_length: max,
        solution_count: count,
        timeout_secs: 0,
        ..SynthesisOptions::default()
    }
}

pub fn permissive_policy() -> EncodingPolicy {
    EncodingPolicy {
        use_workflow_input: UsagePolicy::None,
        use_generated_data: UsagePolicy::None,
        distinct_operation_inputs: false,
    }
}

/// Up to `limit` models of the structural encoding at `length`, each
/// blocked exactly after it is found.
pub fn enumerate_models(
    domain: &SynthesisDomain,
    length: usize,
    policy: &EncodingPolicy,
    limit: usize,
) -> (Automaton, EncodingArena, Vec<(Model, Solution)>) {
    let automaton = Automaton::for_domain(domain, length).unwrap();
    let mut arena = EncodingArena::new();
    let mut formula = encode_workflow(domain, &automaton, &mut arena, policy)
        .unwrap()
        .formula;
    let mut solver = BatsatSolver::new();
    let mut found = Vec::new();
    while found.len() < limit {
        let (result, model) = solver.solve(&formula, None).unwrap();
        if result != SatResult::Sat {
            break;
        }
        let model = model.unwrap();
        let solution = decode_solution(domain, &automaton, &arena, &model).unwrap();
        formula.add_clause(blocking_clause(&solution, &mut arena, BlockingPolicy::Exact).unwrap());
        found.push((model, solution));
    }
    (automaton, arena, found)
}
