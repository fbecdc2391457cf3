//! Operation and workflow I/O contracts.

use synthflow_ir::automaton::{Automaton, StateId};
use synthflow_ir::domain::SynthesisDomain;
use synthflow_ir::taxonomy::{DataSpec, Taxonomy};

use super::{spec_by_dimension, EncodeError, Emitter};
use crate::cnf::Literal;

fn check_width(context: String, declared: usize, width: usize) -> Result<(), EncodeError> {
    if declared > width {
        return Err(EncodeError::SlotWidth {
            context,
            declared,
            width,
        });
    }
    Ok(())
}

/// Whether every predicate of `spec` is a declared type and no dimension
/// is constrained twice. Returns the first offending predicate.
fn check_spec(taxonomy: &Taxonomy, spec: &DataSpec) -> Result<(), Option<usize>> {
    let mut seen = Vec::with_capacity(spec.types.len());
    for &p in &spec.types {
        let Some(dim) = taxonomy.get(p).and_then(|pred| pred.dimension()) else {
            return Err(Some(p));
        };
        if seen.contains(&dim) {
            return Err(None);
        }
        seen.push(dim);
    }
    Ok(())
}

/// Reject inputs the automaton cannot hold or the taxonomy does not declare.
pub(super) fn validate(domain: &SynthesisDomain, automaton: &Automaton) -> Result<(), EncodeError> {
    let taxonomy = &domain.taxonomy;
    for &op in taxonomy.concrete_operations() {
        let pred = taxonomy.predicate(op);
        let Some(sig) = pred.signature.as_ref() else {
            continue;
        };
        for (role, specs, width) in [
            ("input", &sig.inputs, automaton.input_width()),
            ("output", &sig.outputs, automaton.output_width()),
        ] {
            check_width(
                format!("operation '{}' {role}s", pred.label),
                specs.len(),
                width,
            )?;
            for (slot, spec) in specs.iter().enumerate() {
                match check_spec(taxonomy, spec) {
                    Ok(()) => {}
                    Err(Some(predicate)) => {
                        return Err(EncodeError::UnknownSignatureType {
                            operation: pred.label.clone(),
                            role,
                            slot,
                            predicate,
                        })
                    }
                    Err(None) => {
                        return Err(EncodeError::ConflictingDimension {
                            context: format!("operation '{}' {role} {slot}", pred.label),
                        })
                    }
                }
            }
        }
    }

    for (role, specs, width) in [
        ("input", &domain.workflow_inputs, automaton.output_width()),
        ("output", &domain.workflow_outputs, automaton.input_width()),
    ] {
        check_width(format!("workflow {role}s"), specs.len(), width)?;
        for (slot, spec) in specs.iter().enumerate() {
            match check_spec(taxonomy, spec) {
                Ok(()) => {}
                Err(Some(predicate)) => {
                    return Err(EncodeError::UndeclaredWorkflowType {
                        role,
                        slot,
                        predicate,
                    })
                }
                Err(None) => {
                    return Err(EncodeError::ConflictingDimension {
                        context: format!("workflow {role} {slot}"),
                    })
                }
            }
        }
    }
    Ok(())
}

/// Pin the types of `states` to `specs`, under `guard` when given.
///
/// Declared slots take the declared type where one is given and are
/// non-empty in the remaining dimensions; slots past the declared ones are
/// empty.
fn slot_contract(e: &mut Emitter<'_>, guard: Option<Literal>, specs: &[DataSpec], states: &[StateId]) {
    let taxonomy = e.taxonomy;
    for (i, &state) in states.iter().enumerate() {
        let wanted = specs.get(i).map(|spec| spec_by_dimension(taxonomy, spec));
        for dim in taxonomy.dimensions() {
            let lit = match &wanted {
                Some(per_dim) => match per_dim[dim.id] {
                    Some(t) => e.type_of(state, t),
                    None => !e.type_of(state, dim.empty),
                },
                None => e.type_of(state, dim.empty),
            };
            match guard {
                Some(g) => e.clause([!g, lit]),
                None => e.clause([lit]),
            }
        }
    }
}

/// Using a concrete operation at a step fixes the types of its input and
/// output slots.
pub(super) fn operation_contracts(e: &mut Emitter<'_>) {
    let taxonomy = e.taxonomy;
    let automaton = e.automaton;
    for step in 0..automaton.length() {
        let op_state = automaton.operation_state(step);
        let inputs = &automaton.input_block(step).states;
        let outputs = &automaton.output_block(step + 1).states;
        for &op in taxonomy.concrete_operations() {
            let Some(sig) = taxonomy.predicate(op).signature.as_ref() else {
                continue;
            };
            let used = e.uses(op_state, op);
            slot_contract(e, Some(used), &sig.inputs, inputs);
            slot_contract(e, Some(used), &sig.outputs, outputs);
        }
    }
}

/// Workflow inputs occupy output block 0, workflow outputs input block `L`.
pub(super) fn workflow_io(e: &mut Emitter<'_>, inputs: &[DataSpec], outputs: &[DataSpec]) {
    let automaton = e.automaton;
    slot_contract(e, None, inputs, &automaton.output_block(0).states);
    slot_contract(
        e,
        None,
        outputs,
        &automaton.input_block(automaton.length()).states,
    );
}
