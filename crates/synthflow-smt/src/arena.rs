use synthflow_ir::automaton::StateId;

use crate::atoms::{AtomTable, VarId};

/// A quantifier-bound variable after renaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundVariable {
    pub id: VarId,
    /// Surface name at the binding site.
    pub name: String,
    /// States the variable may be instantiated to, ascending.
    pub domain: Vec<StateId>,
}

/// Per-attempt allocation context: atom ids and bound variables.
///
/// One arena is created for every attempted workflow length and dropped with
/// it; the encoder, the compiler and the decoder all share it by reference.
#[derive(Debug, Clone, Default)]
pub struct EncodingArena {
    pub atoms: AtomTable,
    variables: Vec<BoundVariable>,
}

impl EncodingArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, globally unique variable.
    pub fn fresh_variable(&mut self, name: &str, domain: Vec<StateId>) -> VarId {
        let id = self.variables.len();
        self.variables.push(BoundVariable {
            id,
            name: name.to_string(),
            domain,
        });
        id
    }

    pub fn variable(&self, id: VarId) -> &BoundVariable {
        &self.variables[id]
    }

    pub fn variables(&self) -> &[BoundVariable] {
        &self.variables
    }
}
