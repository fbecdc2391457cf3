use std::collections::HashMap;
use std::time::Duration;

use crate::cnf::{AtomId, CnfFormula};

/// Result of a satisfiability check.
#[derive(Debug, Clone, PartialEq)]
pub enum SatResult {
    Sat,
    Unsat,
    /// The solver gave up because the caller's time budget ran out.
    Timeout,
    Unknown(String),
}

/// Satisfying assignment returned with [`SatResult::Sat`].
///
/// Atoms the solver did not report are treated as false.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub values: HashMap<AtomId, bool>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_true_atoms(atoms: impl IntoIterator<Item = AtomId>) -> Self {
        Self {
            values: atoms.into_iter().map(|a| (a, true)).collect(),
        }
    }

    pub fn set(&mut self, atom: AtomId, value: bool) {
        self.values.insert(atom, value);
    }

    pub fn value(&self, atom: AtomId) -> bool {
        self.values.get(&atom).copied().unwrap_or(false)
    }

    /// Atoms assigned true, ascending.
    pub fn true_atoms(&self) -> Vec<AtomId> {
        let mut out: Vec<AtomId> = self
            .values
            .iter()
            .filter_map(|(&a, &v)| v.then_some(a))
            .collect();
        out.sort_unstable();
        out
    }
}

/// Synchronous request/response boundary to a boolean satisfiability solver.
///
/// Every call receives the complete formula; backends keep no state between
/// calls apart from configuration.
pub trait SatSolver {
    type Error: std::error::Error;

    /// Decide `formula`, giving up after `timeout` when one is set.
    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<(SatResult, Option<Model>), Self::Error>;

    /// Short backend name used in logs.
    fn name(&self) -> &str {
        "sat"
    }
}

impl<S: SatSolver + ?Sized> SatSolver for &mut S {
    type Error = S::Error;

    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<(SatResult, Option<Model>), Self::Error> {
        (**self).solve(formula, timeout)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
