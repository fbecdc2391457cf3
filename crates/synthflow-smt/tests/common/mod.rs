#![allow(dead_code)]

use std::collections::HashMap;

use synthflow_ir::automaton::{Automaton, StateId};
use synthflow_ir::domain::SynthesisDomain;
use synthflow_ir::formula::{Formula, FormulaAtom};
use synthflow_ir::taxonomy::{PredicateId, Taxonomy, TaxonomyBuilder};
use synthflow_smt::arena::EncodingArena;
use synthflow_smt::atoms::{AtomKind, Entity};
use synthflow_smt::backends::batsat::BatsatSolver;
use synthflow_smt::cnf::{Clause, CnfFormula, Literal};
use synthflow_smt::compiler::FormulaCompiler;
use synthflow_smt::encoder::{encode_workflow, EncodingPolicy, UsagePolicy};
use synthflow_smt::solver::{Model, SatResult, SatSolver};

/// A: X -> Y and B: Y -> X under `Convert`, C: X -> () directly under the
/// root. `Y` sits below the abstract `Seq`.
pub fn branching_domain() -> SynthesisDomain {
    let mut b = TaxonomyBuilder::new();
    b.operation_root("Operation").unwrap();
    b.add_operation_class("Convert", "Operation").unwrap();
    b.add_dimension("Data").unwrap();
    b.add_type("X", "Data").unwrap();
    b.add_type("Seq", "Data").unwrap();
    b.add_type("Y", "Seq").unwrap();
    b.add_operation("A", "Convert", &[&["X"]], &[&["Y"]])
        .unwrap();
    b.add_operation("B", "Convert", &[&["Y"]], &[&["X"]])
        .unwrap();
    b.add_operation("C", "Operation", &[&["X"]], &[]).unwrap();
    SynthesisDomain::new(b.build().unwrap())
        .with_inputs(&[&["X"]])
        .unwrap()
}

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

pub fn permissive_policy() -> EncodingPolicy {
    EncodingPolicy {
        use_workflow_input: UsagePolicy::None,
        use_generated_data: UsagePolicy::None,
        distinct_operation_inputs: false,
    }
}

pub fn solve(formula: &CnfFormula) -> (SatResult, Option<Model>) {
    BatsatSolver::new().solve(formula, None).unwrap()
}

/// Every model of the structural encoding, distinct on ground atoms.
pub fn structural_models(
    domain: &SynthesisDomain,
    automaton: &Automaton,
    policy: &EncodingPolicy,
    limit: usize,
) -> (EncodingArena, CnfFormula, Vec<Model>) {
    let mut arena = EncodingArena::new();
    let structure = encode_workflow(domain, automaton, &mut arena, policy)
        .unwrap()
        .formula;
    let mut search = structure.clone();
    let mut models = Vec::new();
    while models.len() < limit {
        let (result, model) = solve(&search);
        if result != SatResult::Sat {
            break;
        }
        let model = model.unwrap();
        let blocking = pin(&arena, &model).into_iter().map(|c| !c.literals()[0]);
        search.add_clause(Clause::new(blocking).unwrap());
        models.push(model);
    }
    (arena, structure, models)
}

/// Unit clauses fixing every ground atom of `arena` to its value in `model`.
pub fn pin(arena: &EncodingArena, model: &Model) -> Vec<Clause> {
    arena
        .atoms
        .iter()
        .filter(|(_, atom)| atom.is_ground())
        .map(|(id, _)| Clause::unit(Literal::new(id, model.value(id))))
        .collect()
}

/// Ground facts of one model.
pub struct Workflow {
    pub operations: Vec<PredicateId>,
    pub types: HashMap<(StateId, usize), PredicateId>,
    pub references: HashMap<StateId, StateId>,
}

pub fn read_workflow(taxonomy: &Taxonomy, arena: &EncodingArena, model: &Model) -> Workflow {
    let mut wf = Workflow {
        operations: Vec::new(),
        types: HashMap::new(),
        references: HashMap::new(),
    };
    let mut ops: Vec<(StateId, PredicateId)> = Vec::new();
    for (id, atom) in arena.atoms.iter() {
        if !model.value(id) {
            continue;
        }
        match (atom.kind, atom.subject, atom.predicate, atom.object) {
            (AtomKind::Uses, Entity::State(s), Some(p), _) if taxonomy.is_concrete(p) => {
                ops.push((s, p))
            }
            (AtomKind::TypeOf, Entity::State(s), Some(p), _) if taxonomy.is_concrete(p) => {
                let dim = taxonomy.predicate(p).dimension().unwrap();
                wf.types.insert((s, dim), p);
            }
            (AtomKind::RefersTo, Entity::State(s), _, Some(Entity::State(t))) => {
                wf.references.insert(s, t);
            }
            _ => {}
        }
    }
    ops.sort();
    wf.operations = ops.into_iter().map(|(_, p)| p).collect();
    wf
}

/// Reference semantics of a formula over a decoded workflow.
pub fn evaluate(
    formula: &Formula,
    step: usize,
    env: &HashMap<String, StateId>,
    taxonomy: &Taxonomy,
    automaton: &Automaton,
    wf: &Workflow,
) -> bool {
    let eval = |f: &Formula, s: usize, env: &HashMap<String, StateId>| {
        evaluate(f, s, env, taxonomy, automaton, wf)
    };
    let length = automaton.length();
    match formula {
        Formula::Atom(atom) => match atom {
            FormulaAtom::True => true,
            FormulaAtom::False => false,
            FormulaAtom::Operation(p) => taxonomy.subsumes(*p, wf.operations[step]),
            FormulaAtom::HasType(x, p) => {
                let dim = taxonomy.predicate(*p).dimension().unwrap();
                taxonomy.subsumes(*p, wf.types[&(env[x], dim)])
            }
            FormulaAtom::Consumes(x) => automaton
                .input_block(step)
                .states
                .iter()
                .any(|i| wf.references.get(i) == Some(&env[x])),
            FormulaAtom::Produces(x) => automaton.state(env[x]).block == step + 1,
            FormulaAtom::Identical(x, y) => env[x] == env[y],
        },
        Formula::Not(f) => !eval(f, step, env),
        Formula::And(fs) => fs.iter().all(|f| eval(f, step, env)),
        Formula::Or(fs) => fs.iter().any(|f| eval(f, step, env)),
        Formula::Implies(a, b) => !eval(a, step, env) || eval(b, step, env),
        Formula::Iff(a, b) => eval(a, step, env) == eval(b, step, env),
        Formula::Xor(a, b) => eval(a, step, env) != eval(b, step, env),
        Formula::Exists(x, body) | Formula::Forall(x, body) => {
            let mut results = automaton.states_up_to(step + 1).into_iter().map(|s| {
                let mut inner = env.clone();
                inner.insert(x.clone(), s);
                eval(body, step, &inner)
            });
            if matches!(formula, Formula::Exists(..)) {
                results.any(|r| r)
            } else {
                results.all(|r| r)
            }
        }
        Formula::Next(f) => step + 1 < length && eval(f, step + 1, env),
        Formula::Globally(f) => (step..length).all(|t| eval(f, t, env)),
        Formula::Finally(f) => (step..length).any(|t| eval(f, t, env)),
        Formula::Until(_, _) => unreachable!("until is not evaluated"),
    }
}

/// For every structural model: the model extended with the compiled formula
/// is satisfiable exactly when the formula holds, and extended with the
/// compiled negation exactly when it does not.
pub fn assert_negation_duality(domain: &SynthesisDomain, length: usize, formula: &Formula) {
    let automaton = Automaton::for_domain(domain, length).unwrap();
    let (arena, structure, models) =
        structural_models(domain, &automaton, &permissive_policy(), 64);
    assert!(!models.is_empty());
    for model in &models {
        let wf = read_workflow(&domain.taxonomy, &arena, model);
        let holds = evaluate(
            formula,
            0,
            &HashMap::new(),
            &domain.taxonomy,
            &automaton,
            &wf,
        );
        for negate in [false, true] {
            let mut scratch = arena.clone();
            let mut compiler = FormulaCompiler::new(&domain.taxonomy, &automaton, &mut scratch);
            let clauses = if negate {
                compiler.compile_negated(formula, 0)
            } else {
                compiler.compile(formula, 0)
            }
            .unwrap();
            let side = compiler.take_side_constraints();
            let mut cnf = structure.clone();
            cnf.extend(pin(&arena, model));
            cnf.extend(clauses);
            cnf.extend(side);
            cnf.reserve_atoms(scratch.atoms.len() as u32);
            let (result, _) = solve(&cnf);
            assert_eq!(
                result == SatResult::Sat,
                holds != negate,
                "formula {formula} (negated: {negate}) on operations {:?}",
                wf.operations
            );
        }
    }
}
