//! Structural properties every decoded workflow must have, checked on the
//! raw models as well as on the decoded solutions.

mod common;

use std::collections::HashMap;

use synthflow_engine::solution::Solution;
use synthflow_ir::automaton::{Automaton, StateId};
use synthflow_ir::domain::SynthesisDomain;
use synthflow_ir::taxonomy::PredicateId;
use synthflow_smt::arena::EncodingArena;
use synthflow_smt::atoms::{Atom, Entity};
use synthflow_smt::encoder::EncodingPolicy;
use synthflow_smt::solver::Model;

use common::{bio_domain, chain_domain, enumerate_models, permissive_policy};

fn holds(arena: &EncodingArena, model: &Model, atom: Atom) -> bool {
    arena.atoms.lookup(&atom).is_some_and(|id| model.value(id))
}

fn check_closure(domain: &SynthesisDomain, arena: &EncodingArena, model: &Model, solution: &Solution) {
    let tax = &domain.taxonomy;
    for slot in solution.slots() {
        for pred in tax.predicates() {
            let Some(dim) = pred.dimension() else {
                continue;
            };
            let expected = tax.subsumes(pred.id, slot.type_ids[dim]);
            let actual = holds(arena, model, Atom::type_of(Entity::State(slot.state), pred.id));
            assert_eq!(
                actual, expected,
                "state {} type {}",
                slot.state, pred.label
            );
        }
    }
    for step in &solution.steps {
        for pred in tax.predicates().iter().filter(|p| p.is_operation()) {
            let expected = tax.subsumes(pred.id, step.operation_id);
            let actual = holds(arena, model, Atom::uses(step.operation_state, pred.id));
            assert_eq!(actual, expected, "operation {}", pred.label);
        }
    }
}

fn check_emptiness(domain: &SynthesisDomain, solution: &Solution) {
    let tax = &domain.taxonomy;
    for slot in solution.slots() {
        let empties = tax
            .dimensions()
            .iter()
            .filter(|d| slot.type_ids[d.id] == d.empty)
            .count();
        assert!(empties == 0 || empties == tax.dimensions().len());
        assert_eq!(slot.empty, empties > 0);
        assert_eq!(slot.types.is_empty(), slot.empty);
    }
}

fn check_references(automaton: &Automaton, solution: &Solution) {
    let mut produced: HashMap<StateId, &[PredicateId]> = HashMap::new();
    for slot in &solution.workflow_inputs {
        produced.insert(slot.state, &slot.type_ids);
    }
    for step in &solution.steps {
        for slot in &step.outputs {
            produced.insert(slot.state, &slot.type_ids);
        }
    }

    let consumers = solution
        .steps
        .iter()
        .enumerate()
        .flat_map(|(i, s)| s.inputs.iter().map(move |slot| (i, slot)))
        .chain(
            solution
                .workflow_outputs
                .iter()
                .map(|slot| (solution.length, slot)),
        );
    for (step, slot) in consumers {
        match slot.source {
            None => assert!(slot.empty, "non-empty slot {} without a source", slot.state),
            Some(source) => {
                assert!(!slot.empty);
                assert!(
                    automaton.state(source).block <= step,
                    "slot {} at step {step} reads the future state {source}",
                    slot.state
                );
                assert_eq!(produced[&source], slot.type_ids.as_slice());
            }
        }
    }
}

fn check_contracts(domain: &SynthesisDomain, solution: &Solution) {
    let tax = &domain.taxonomy;
    for step in &solution.steps {
        let signature = tax.predicate(step.operation_id).signature.as_ref().unwrap();
        for (specs, slots) in [
            (&signature.inputs, &step.inputs),
            (&signature.outputs, &step.outputs),
        ] {
            for (i, slot) in slots.iter().enumerate() {
                let Some(spec) = specs.get(i) else {
                    assert!(slot.empty);
                    continue;
                };
                assert!(!slot.empty);
                for dim in tax.dimensions() {
                    if let Some(wanted) = spec.type_in(tax, dim.id) {
                        assert!(tax.subsumes(wanted, slot.type_ids[dim.id]));
                    }
                }
            }
        }
    }
}

fn check_all(domain: &SynthesisDomain, length: usize, policy: &EncodingPolicy, limit: usize) -> usize {
    let (automaton, arena, found) = enumerate_models(domain, length, policy, limit);
    for (model, solution) in &found {
        check_closure(domain, &arena, model, solution);
        check_emptiness(domain, solution);
        check_references(&automaton, solution);
        check_contracts(domain, solution);
    }
    found.len()
}

#[test]
fn permissive_models_respect_the_structure() {
    // Translate or Reformat first, then every legal continuation
    assert_eq!(check_all(&bio_domain(), 2, &permissive_policy(), 100), 23);
}

#[test]
fn default_policy_models_respect_the_structure() {
    let found = check_all(&bio_domain(), 2, &EncodingPolicy::default(), 40);
    assert!(found > 0);
}

#[test]
fn chain_has_a_single_wiring() {
    let (_, _, found) = enumerate_models(&chain_domain(), 2, &EncodingPolicy::default(), 10);
    assert_eq!(found.len(), 1);
    let solution = &found[0].1;
    assert_eq!(solution.operations(), vec!["A", "B"]);
    check_emptiness(&chain_domain(), solution);
}

#[test]
fn workflow_inputs_are_pinned() {
    let domain = bio_domain();
    let tax = &domain.taxonomy;
    let (_, _, found) = enumerate_models(&domain, 1, &permissive_policy(), 20);
    assert!(!found.is_empty());
    for (_, solution) in &found {
        assert_eq!(solution.workflow_inputs[0].types, vec!["DNA", "FASTA"]);
        assert_eq!(solution.workflow_inputs[1].types, vec!["Text", "Plain"]);
        let output = &solution.workflow_outputs[0];
        let text = tax.lookup("Text").unwrap();
        assert_eq!(output.type_ids[0], text);
    }
}
