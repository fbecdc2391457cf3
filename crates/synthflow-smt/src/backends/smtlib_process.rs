use std::time::Duration;

use super::process::{run_solver, ProcessError, ProcessOutcome, SolverCommand};
use super::smtlib_printer::{parse_smtlib_output, to_smtlib_script};
use super::BackendError;
use crate::cnf::CnfFormula;
use crate::solver::{Model, SatResult, SatSolver};

/// External SMT solver reading an SMT-LIB2 script on stdin.
#[derive(Debug, Clone)]
pub struct SmtLibProcessSolver {
    command: SolverCommand,
}

impl SmtLibProcessSolver {
    pub fn new(command: SolverCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &SolverCommand {
        &self.command
    }
}

impl Default for SmtLibProcessSolver {
    fn default() -> Self {
        Self::new(SolverCommand::new("z3", &["-in", "-smt2"]))
    }
}

impl SatSolver for SmtLibProcessSolver {
    type Error = BackendError;

    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<(SatResult, Option<Model>), BackendError> {
        match run_solver(&self.command, to_smtlib_script(formula), timeout)? {
            ProcessOutcome::TimedOut => Ok((SatResult::Timeout, None)),
            ProcessOutcome::Finished {
                stdout,
                stderr,
                exit_code,
            } => {
                if stdout.trim().is_empty() && exit_code != Some(0) {
                    return Err(ProcessError::Failed {
                        program: self.command.program.clone(),
                        status: exit_code
                            .map_or_else(|| "signal".to_string(), |c| format!("exit {c}")),
                        stderr: stderr.trim().to_string(),
                    }
                    .into());
                }
                Ok(parse_smtlib_output(&stdout)?)
            }
        }
    }

    fn name(&self) -> &str {
        "smtlib"
    }
}
