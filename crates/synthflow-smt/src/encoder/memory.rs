//! Memory referencing discipline of the data track.
//!
//! Every input slot references exactly one output state visible at its
//! step, or the null state. A reference makes the slot's type equal to the
//! referenced state's type; referencing null is the same as being empty.

use super::Emitter;
use crate::cnf::Literal;

/// Exactly one reference per input slot; no reference into the future.
pub(super) fn reference_legality(e: &mut Emitter<'_>) {
    let automaton = e.automaton;
    let null = automaton.null_state();
    for block in automaton.input_blocks() {
        let visible = automaton.states_up_to(block.step);
        let later = automaton.states_after(block.step);
        for &input in &block.states {
            let candidates: Vec<Literal> = std::iter::once(null)
                .chain(visible.iter().copied())
                .map(|target| e.refers_to(input, target))
                .collect();
            e.at_most_one(&candidates);
            e.clause(candidates);
            for &target in &later {
                let r = e.refers_to(input, target);
                e.clause([!r]);
            }
        }
    }
}

/// Referencing a state equates types in every dimension; referencing null
/// is equivalent to the empty type.
pub(super) fn reference_agreement(e: &mut Emitter<'_>) {
    let automaton = e.automaton;
    let taxonomy = e.taxonomy;
    let null = automaton.null_state();
    for block in automaton.input_blocks() {
        let visible = automaton.states_up_to(block.step);
        for &input in &block.states {
            for &target in &visible {
                let r = e.refers_to(input, target);
                for dim in taxonomy.dimensions() {
                    for &t in &dim.concrete {
                        let slot = e.type_of(input, t);
                        let source = e.type_of(target, t);
                        e.clause([!r, !slot, source]);
                        e.clause([!r, slot, !source]);
                    }
                }
            }
            let r = e.refers_to(input, null);
            for dim in taxonomy.dimensions() {
                let empty = e.type_of(input, dim.empty);
                e.implies(r, empty);
                e.implies(empty, r);
            }
        }
    }
}

/// No operation takes the same instance in two of its input slots.
pub(super) fn distinct_operation_inputs(e: &mut Emitter<'_>) {
    let automaton = e.automaton;
    for step in 0..automaton.length() {
        let inputs = &automaton.input_block(step).states;
        let visible = automaton.states_up_to(step);
        for (i, &a) in inputs.iter().enumerate() {
            for &b in &inputs[i + 1..] {
                for &target in &visible {
                    let ra = e.refers_to(a, target);
                    let rb = e.refers_to(b, target);
                    e.clause([!ra, !rb]);
                }
            }
        }
    }
}
