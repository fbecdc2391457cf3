//! Solver backends.
//!
//! Two process backends speak to external executables (DIMACS clause lists
//! or SMT-LIB assertion scripts). [`batsat::BatsatSolver`] decides formulas
//! in process; with the `z3` feature, `z3_backend::Z3Solver` does too.

pub mod batsat;
pub mod dimacs;
pub mod dimacs_process;
pub mod process;
pub mod smtlib_printer;
pub mod smtlib_process;
#[cfg(feature = "z3")]
pub mod z3_backend;

use thiserror::Error;

/// Failure at the solver boundary, distinct from an unsatisfiable answer.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Process(#[from] process::ProcessError),
    #[error(transparent)]
    Dimacs(#[from] dimacs::DimacsError),
    #[error(transparent)]
    SmtLib(#[from] smtlib_printer::SmtLibError),
}
