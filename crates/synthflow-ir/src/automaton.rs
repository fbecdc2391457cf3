use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

use crate::domain::SynthesisDomain;

/// Global index of a state inside an [`Automaton`].
pub type StateId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum AutomatonError {
    #[error("workflow length must be positive")]
    #[diagnostic(
        code(synthflow::automaton::zero_length),
        help("search lengths start at 1")
    )]
    NonPositiveLength,
}

/// Track and role of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateRole {
    /// Operation-sequence track: the operation executed at a step.
    Operation,
    /// Data track: an input slot consuming a memory reference.
    Input,
    /// Data track: a produced (or workflow-provided) data instance.
    Output,
    /// Absence of data / reference.
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub id: StateId,
    /// Position inside the block.
    pub local_index: usize,
    /// Block index. For output states this is the step at which the data
    /// becomes visible; block 0 holds the workflow inputs.
    pub block: usize,
    pub role: StateRole,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            StateRole::Operation => write!(f, "op[{}]", self.block),
            StateRole::Input => write!(f, "in[{}.{}]", self.block, self.local_index),
            StateRole::Output => write!(f, "out[{}.{}]", self.block, self.local_index),
            StateRole::Null => write!(f, "null"),
        }
    }
}

/// Ordered states sharing a step and a role.
#[derive(Debug, Clone)]
pub struct Block {
    pub step: usize,
    pub role: StateRole,
    pub states: Vec<StateId>,
}

/// Two synchronized fixed-length tracks for one workflow length.
///
/// Layout for length `L`:
/// - `L` operation states;
/// - `L + 1` output blocks of width `O`; block 0 holds workflow inputs and
///   block `k + 1` holds the outputs of operation `k`;
/// - `L + 1` input blocks of width `I`; block `k` holds the inputs of
///   operation `k` and block `L` holds the workflow outputs.
#[derive(Debug, Clone)]
pub struct Automaton {
    length: usize,
    input_width: usize,
    output_width: usize,
    states: Vec<State>,
    operation_states: Vec<StateId>,
    input_blocks: Vec<Block>,
    output_blocks: Vec<Block>,
    null_state: StateId,
}

impl Automaton {
    pub fn new(
        length: usize,
        input_width: usize,
        output_width: usize,
    ) -> Result<Self, AutomatonError> {
        if length == 0 {
            return Err(AutomatonError::NonPositiveLength);
        }
        let mut states = vec![State {
            id: 0,
            local_index: 0,
            block: 0,
            role: StateRole::Null,
        }];
        let mut operation_states = Vec::with_capacity(length);
        let mut input_blocks = Vec::with_capacity(length + 1);
        let mut output_blocks = Vec::with_capacity(length + 1);

        let block = |states: &mut Vec<State>, step: usize, role: StateRole, width: usize| {
            let ids = (0..width)
                .map(|local_index| {
                    let id = states.len();
                    states.push(State {
                        id,
                        local_index,
                        block: step,
                        role,
                    });
                    id
                })
                .collect();
            Block {
                step,
                role,
                states: ids,
            }
        };

        for step in 0..=length {
            output_blocks.push(block(&mut states, step, StateRole::Output, output_width));
            input_blocks.push(block(&mut states, step, StateRole::Input, input_width));
            if step < length {
                let op = block(&mut states, step, StateRole::Operation, 1);
                operation_states.extend(op.states);
            }
        }

        Ok(Self {
            length,
            input_width,
            output_width,
            states,
            operation_states,
            input_blocks,
            output_blocks,
            null_state: 0,
        })
    }

    /// Build an automaton wide enough for every operation signature and for
    /// the declared workflow inputs and outputs.
    pub fn for_domain(domain: &SynthesisDomain, length: usize) -> Result<Self, AutomatonError> {
        let (max_in, max_out) = domain.taxonomy.max_arity();
        let input_width = max_in.max(domain.workflow_outputs.len()).max(1);
        let output_width = max_out.max(domain.workflow_inputs.len()).max(1);
        Self::new(length, input_width, output_width)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn null_state(&self) -> StateId {
        self.null_state
    }

    pub fn operation_state(&self, step: usize) -> StateId {
        self.operation_states[step]
    }

    pub fn operation_states(&self) -> &[StateId] {
        &self.operation_states
    }

    /// Input block `step`; block `length()` holds the workflow outputs.
    pub fn input_block(&self, step: usize) -> &Block {
        &self.input_blocks[step]
    }

    pub fn input_blocks(&self) -> &[Block] {
        &self.input_blocks
    }

    /// Output block `step`; block 0 holds the workflow inputs.
    pub fn output_block(&self, step: usize) -> &Block {
        &self.output_blocks[step]
    }

    pub fn output_blocks(&self) -> &[Block] {
        &self.output_blocks
    }

    /// Output states visible at `step`: produced at or before it, ascending.
    pub fn states_up_to(&self, step: usize) -> Vec<StateId> {
        let last = step.min(self.length);
        self.output_blocks[..=last]
            .iter()
            .flat_map(|b| b.states.iter().copied())
            .collect()
    }

    /// Output states not yet visible at `step`.
    pub fn states_after(&self, step: usize) -> Vec<StateId> {
        if step >= self.length {
            return Vec::new();
        }
        self.output_blocks[step + 1..]
            .iter()
            .flat_map(|b| b.states.iter().copied())
            .collect()
    }

    /// Every input and output state, in global order.
    pub fn data_states(&self) -> impl Iterator<Item = &State> {
        self.states
            .iter()
            .filter(|s| matches!(s.role, StateRole::Input | StateRole::Output))
    }
}
