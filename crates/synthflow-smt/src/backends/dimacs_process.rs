use std::time::Duration;

use super::dimacs::{parse_solver_output, to_dimacs};
use super::process::{run_solver, ProcessError, ProcessOutcome, SolverCommand};
use super::BackendError;
use crate::cnf::CnfFormula;
use crate::solver::{Model, SatResult, SatSolver};

/// External SAT solver reading DIMACS on stdin.
///
/// SAT-competition exit codes (10 satisfiable, 20 unsatisfiable) are
/// accepted next to 0; anything else without a status line is a failure.
#[derive(Debug, Clone)]
pub struct DimacsProcessSolver {
    command: SolverCommand,
}

impl DimacsProcessSolver {
    pub fn new(command: SolverCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &SolverCommand {
        &self.command
    }
}

impl Default for DimacsProcessSolver {
    fn default() -> Self {
        Self::new(SolverCommand::new("cadical", &["-q"]))
    }
}

impl SatSolver for DimacsProcessSolver {
    type Error = BackendError;

    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<(SatResult, Option<Model>), BackendError> {
        match run_solver(&self.command, to_dimacs(formula), timeout)? {
            ProcessOutcome::TimedOut => Ok((SatResult::Timeout, None)),
            ProcessOutcome::Finished {
                stdout,
                stderr,
                exit_code,
            } => match parse_solver_output(&stdout) {
                Ok(answer) => Ok(answer),
                Err(err) if matches!(exit_code, Some(0 | 10 | 20)) => Err(err.into()),
                Err(_) => Err(ProcessError::Failed {
                    program: self.command.program.clone(),
                    status: exit_code.map_or_else(|| "signal".to_string(), |c| format!("exit {c}")),
                    stderr: stderr.trim().to_string(),
                }
                .into()),
            },
        }
    }

    fn name(&self) -> &str {
        "dimacs"
    }
}
