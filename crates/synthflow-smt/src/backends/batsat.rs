//! In-process solving with the batsat CDCL solver through `rustsat`.
//!
//! Every call builds a fresh solver from the complete formula. With a
//! timeout the search runs on a worker thread; batsat cannot be interrupted,
//! so a worker that misses the deadline is abandoned and its answer dropped.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use rustsat::solvers::{Solve, SolverResult};
use rustsat::types::{Clause as SatClause, Lit, TernaryVal};
use rustsat_batsat::BasicSolver;
use thiserror::Error;
use tracing::debug;

use crate::cnf::{CnfFormula, Literal};
use crate::solver::{Model, SatResult, SatSolver};

#[derive(Debug, Error)]
pub enum BatsatError {
    #[error("batsat: {0}")]
    Solver(String),
    #[error("batsat worker exited without an answer")]
    WorkerLost,
}

type Answer = Result<(SatResult, Option<Model>), BatsatError>;

#[derive(Debug, Clone, Default)]
pub struct BatsatSolver {
    calls: u64,
}

impl BatsatSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solver calls over the lifetime of this backend.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

/// Atom ids start at 1, batsat variables at 0.
fn to_lit(lit: Literal) -> Lit {
    let var = lit.atom() - 1;
    if lit.is_positive() {
        Lit::positive(var)
    } else {
        Lit::negative(var)
    }
}

fn solver_error(err: impl std::fmt::Display) -> BatsatError {
    BatsatError::Solver(err.to_string())
}

fn run(clauses: Vec<Vec<Literal>>) -> Answer {
    let mut solver = BasicSolver::default();
    let mut mentioned = BTreeSet::new();
    for literals in clauses {
        if literals.is_empty() {
            return Ok((SatResult::Unsat, None));
        }
        mentioned.extend(literals.iter().map(|l| l.atom()));
        let clause: SatClause = literals.into_iter().map(to_lit).collect();
        solver.add_clause(clause).map_err(solver_error)?;
    }
    match solver.solve().map_err(solver_error)? {
        SolverResult::Sat => {
            let mut model = Model::new();
            for atom in mentioned {
                let value = solver
                    .lit_val(to_lit(Literal::positive(atom)))
                    .map_err(solver_error)?;
                model.set(atom, value == TernaryVal::True);
            }
            Ok((SatResult::Sat, Some(model)))
        }
        SolverResult::Unsat => Ok((SatResult::Unsat, None)),
        SolverResult::Interrupted => Ok((SatResult::Unknown("batsat was interrupted".into()), None)),
    }
}

impl SatSolver for BatsatSolver {
    type Error = BatsatError;

    fn solve(&mut self, formula: &CnfFormula, timeout: Option<Duration>) -> Answer {
        self.calls += 1;
        let clauses: Vec<Vec<Literal>> = formula
            .clauses()
            .iter()
            .map(|c| c.literals().to_vec())
            .collect();
        let Some(timeout) = timeout else {
            return run(clauses);
        };
        if timeout.is_zero() {
            return Ok((SatResult::Timeout, None));
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(run(clauses));
        });
        match rx.recv_timeout(timeout) {
            Ok(answer) => answer,
            Err(RecvTimeoutError::Timeout) => {
                debug!(atoms = formula.num_atoms(), "batsat worker abandoned after timeout");
                Ok((SatResult::Timeout, None))
            }
            Err(RecvTimeoutError::Disconnected) => Err(BatsatError::WorkerLost),
        }
    }

    fn name(&self) -> &str {
        "batsat"
    }
}
