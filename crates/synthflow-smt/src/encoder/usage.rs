//! Usage completeness of workflow inputs and generated data.

use synthflow_ir::automaton::StateId;

use super::{Emitter, UsagePolicy};
use crate::cnf::Literal;

/// References to `target` from every input slot that can see it.
fn references_to(e: &mut Emitter<'_>, target: StateId) -> Vec<Literal> {
    let automaton = e.automaton;
    let produced_at = automaton.state(target).block;
    let mut out = Vec::new();
    for block in &automaton.input_blocks()[produced_at..] {
        for &input in &block.states {
            out.push(e.refers_to(input, target));
        }
    }
    out
}

/// `All`: every declared workflow input is referenced. `One`: at least one
/// of them is.
pub(super) fn workflow_input_usage(e: &mut Emitter<'_>, declared: usize, policy: UsagePolicy) {
    let automaton = e.automaton;
    let inputs = &automaton.output_block(0).states[..declared];
    match policy {
        UsagePolicy::None => {}
        UsagePolicy::All => {
            for &state in inputs {
                let refs = references_to(e, state);
                e.clause(refs);
            }
        }
        UsagePolicy::One => {
            if inputs.is_empty() {
                return;
            }
            let mut refs = Vec::new();
            for &state in inputs {
                refs.extend(references_to(e, state));
            }
            e.clause(refs);
        }
    }
}

/// `All`: every non-empty output of every step is referenced later. `One`:
/// per step, some output is referenced unless the operation produced
/// nothing.
pub(super) fn generated_data_usage(e: &mut Emitter<'_>, policy: UsagePolicy) {
    let automaton = e.automaton;
    let taxonomy = e.taxonomy;
    let Some(first_dim) = taxonomy.dimensions().first() else {
        return;
    };
    for step in 1..=automaton.length() {
        let outputs = &automaton.output_block(step).states;
        match policy {
            UsagePolicy::None => {}
            UsagePolicy::All => {
                for &state in outputs {
                    let empty = e.type_of(state, first_dim.empty);
                    let refs = references_to(e, state);
                    e.clause(std::iter::once(empty).chain(refs));
                }
            }
            UsagePolicy::One => {
                let Some(&first) = outputs.first() else {
                    continue;
                };
                let empty = e.type_of(first, first_dim.empty);
                let mut refs = vec![empty];
                for &state in outputs {
                    refs.extend(references_to(e, state));
                }
                e.clause(refs);
            }
        }
    }
}
