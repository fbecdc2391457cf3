//! Decoding satisfying assignments into workflows, and blocking them.

use std::fmt;

use serde::Serialize;
use synthflow_ir::automaton::{Automaton, StateId};
use synthflow_ir::domain::SynthesisDomain;
use synthflow_ir::taxonomy::{PredicateId, Taxonomy};
use synthflow_smt::arena::EncodingArena;
use synthflow_smt::atoms::{Atom, Entity};
use synthflow_smt::cnf::{Clause, Literal};
use synthflow_smt::solver::Model;
use thiserror::Error;

/// Which solutions count as repeats of an already found one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingPolicy {
    /// Same operations, types and references.
    Exact,
    /// Same operation sequence, whatever the data wiring.
    OperationSequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("model selects no concrete operation at step {step}")]
    MissingOperation { step: usize },
    #[error("model assigns no concrete type to state {state} in dimension {dimension}")]
    MissingType { state: StateId, dimension: usize },
}

/// One data slot of the decoded workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSlot {
    pub state: StateId,
    /// Concrete type per dimension, empty types included.
    #[serde(skip)]
    pub type_ids: Vec<PredicateId>,
    /// Labels of the non-empty types.
    pub types: Vec<String>,
    /// Referenced output state, for input slots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<StateId>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionStep {
    pub operation: String,
    #[serde(skip)]
    pub operation_id: PredicateId,
    #[serde(skip)]
    pub operation_state: StateId,
    pub inputs: Vec<DataSlot>,
    pub outputs: Vec<DataSlot>,
}

/// A synthesized workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub length: usize,
    pub workflow_inputs: Vec<DataSlot>,
    pub steps: Vec<SolutionStep>,
    pub workflow_outputs: Vec<DataSlot>,
}

impl Solution {
    pub fn operations(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.operation.as_str()).collect()
    }

    pub fn operation_ids(&self) -> Vec<PredicateId> {
        self.steps.iter().map(|s| s.operation_id).collect()
    }

    /// Every data slot: workflow inputs, then per step inputs and outputs,
    /// then workflow outputs.
    pub fn slots(&self) -> impl Iterator<Item = &DataSlot> {
        self.workflow_inputs
            .iter()
            .chain(
                self.steps
                    .iter()
                    .flat_map(|s| s.inputs.iter().chain(s.outputs.iter())),
            )
            .chain(self.workflow_outputs.iter())
    }
}

fn holds(arena: &EncodingArena, model: &Model, atom: Atom) -> bool {
    arena
        .atoms
        .lookup(&atom)
        .is_some_and(|id| model.value(id))
}

fn decode_slot(
    taxonomy: &Taxonomy,
    automaton: &Automaton,
    arena: &EncodingArena,
    model: &Model,
    state: StateId,
    input_step: Option<usize>,
) -> Result<DataSlot, DecodeError> {
    let mut type_ids = Vec::with_capacity(taxonomy.dimensions().len());
    let mut types = Vec::new();
    let mut empty = false;
    for dim in taxonomy.dimensions() {
        let found = taxonomy
            .concrete_types(dim.id)
            .iter()
            .copied()
            .find(|&t| holds(arena, model, Atom::type_of(Entity::State(state), t)))
            .ok_or(DecodeError::MissingType {
                state,
                dimension: dim.id,
            })?;
        if found == dim.empty {
            empty = true;
        } else {
            types.push(taxonomy.label(found).to_string());
        }
        type_ids.push(found);
    }
    let source = input_step.and_then(|step| {
        automaton
            .states_up_to(step)
            .into_iter()
            .find(|&target| holds(arena, model, Atom::refers_to(state, target)))
    });
    Ok(DataSlot {
        state,
        type_ids,
        types,
        source,
        empty,
    })
}

/// Read the workflow chosen by `model` off the ground atoms of `arena`.
pub fn decode_solution(
    domain: &SynthesisDomain,
    automaton: &Automaton,
    arena: &EncodingArena,
    model: &Model,
) -> Result<Solution, DecodeError> {
    let taxonomy = &domain.taxonomy;
    let slots = |states: &[StateId], input_step: Option<usize>| {
        states
            .iter()
            .map(|&s| decode_slot(taxonomy, automaton, arena, model, s, input_step))
            .collect::<Result<Vec<_>, _>>()
    };

    let length = automaton.length();
    let mut steps = Vec::with_capacity(length);
    for step in 0..length {
        let op_state = automaton.operation_state(step);
        let operation = taxonomy
            .concrete_operations()
            .iter()
            .copied()
            .find(|&op| holds(arena, model, Atom::uses(op_state, op)))
            .ok_or(DecodeError::MissingOperation { step })?;
        steps.push(SolutionStep {
            operation: taxonomy.label(operation).to_string(),
            operation_id: operation,
            operation_state: op_state,
            inputs: slots(&automaton.input_block(step).states, Some(step))?,
            outputs: slots(&automaton.output_block(step + 1).states, None)?,
        });
    }

    Ok(Solution {
        length,
        workflow_inputs: slots(&automaton.output_block(0).states, None)?,
        steps,
        workflow_outputs: slots(&automaton.input_block(length).states, Some(length))?,
    })
}

/// Clause excluding `solution` (and, for [`BlockingPolicy::OperationSequence`],
/// every workflow with its operation sequence) from further search.
///
/// `None` when there is nothing to block on.
pub fn blocking_clause(
    solution: &Solution,
    arena: &mut EncodingArena,
    policy: BlockingPolicy,
) -> Option<Clause> {
    let atoms = &mut arena.atoms;
    let mut facts: Vec<Literal> = solution
        .steps
        .iter()
        .map(|s| atoms.uses(s.operation_state, s.operation_id))
        .collect();
    if policy == BlockingPolicy::Exact {
        for slot in solution.slots() {
            for &t in &slot.type_ids {
                facts.push(atoms.type_of(slot.state, t));
            }
            if let Some(target) = slot.source {
                facts.push(atoms.refers_to(slot.state, target));
            }
        }
    }
    if facts.is_empty() {
        return None;
    }
    Clause::new(facts.into_iter().map(|lit| !lit))
}

fn write_slot(f: &mut fmt::Formatter<'_>, slot: &DataSlot) -> fmt::Result {
    match slot.source {
        Some(source) => write!(f, "s{}<-s{source}", slot.state)?,
        None => write!(f, "s{}", slot.state)?,
    }
    if !slot.types.is_empty() {
        write!(f, ":{}", slot.types.join("+"))?;
    }
    Ok(())
}

fn write_slots(f: &mut fmt::Formatter<'_>, slots: &[DataSlot]) -> fmt::Result {
    for (i, slot) in slots.iter().filter(|s| !s.empty).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_slot(f, slot)?;
    }
    Ok(())
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inputs: ")?;
        write_slots(f, &self.workflow_inputs)?;
        writeln!(f)?;
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "{}: {}(", i + 1, step.operation)?;
            write_slots(f, &step.inputs)?;
            write!(f, ") -> ")?;
            write_slots(f, &step.outputs)?;
            writeln!(f)?;
        }
        write!(f, "outputs: ")?;
        write_slots(f, &self.workflow_outputs)
    }
}
