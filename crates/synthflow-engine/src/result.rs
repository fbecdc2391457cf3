use std::fmt;

use miette::Diagnostic;
use serde::Serialize;
use synthflow_smt::compiler::CompileError;
use thiserror::Error;

use crate::options::OptionsError;
use crate::solution::Solution;

/// Errors that abort a whole run. Per-length problems are recorded in
/// [`LengthAttempt::rejected`] instead.
#[derive(Debug, Error, Diagnostic)]
pub enum SynthesisError {
    #[error("invalid options: {0}")]
    #[diagnostic(transparent)]
    Options(#[from] OptionsError),
    #[error("constraint compilation failed: {0}")]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),
}

/// Why the search stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// The requested number of solutions was collected.
    SolutionCountReached,
    /// Every length in range was searched to exhaustion.
    SearchExhausted,
    /// The overall deadline passed.
    Timeout,
    /// The solver could not be run or its answer could not be used.
    SolverFailure(String),
    /// The solver gave up without an answer.
    Unknown(String),
    Cancelled,
}

impl Termination {
    /// Stable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Termination::SolutionCountReached => "solution_count_reached",
            Termination::SearchExhausted => "search_exhausted",
            Termination::Timeout => "timeout",
            Termination::SolverFailure(_) => "solver_failure",
            Termination::Unknown(_) => "unknown",
            Termination::Cancelled => "cancelled",
        }
    }
}

/// What happened at one workflow length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LengthAttempt {
    pub length: usize,
    pub solutions: usize,
    pub clauses: usize,
    pub atoms: usize,
    pub solver_calls: usize,
    /// Set when the length could not be encoded; no solver was called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
}

impl LengthAttempt {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            length,
            solutions: 0,
            clauses: 0,
            atoms: 0,
            solver_calls: 0,
            rejected: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisReport {
    pub solutions: Vec<Solution>,
    pub termination: Termination,
    pub attempts: Vec<LengthAttempt>,
}

impl SynthesisReport {
    pub fn solutions_of_length(&self, length: usize) -> impl Iterator<Item = &Solution> {
        self.solutions.iter().filter(move |s| s.length == length)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::SolutionCountReached => write!(f, "requested solution count reached"),
            Termination::SearchExhausted => write!(f, "search space exhausted"),
            Termination::Timeout => write!(f, "timeout"),
            Termination::SolverFailure(reason) => write!(f, "solver failure: {reason}"),
            Termination::Unknown(reason) => write!(f, "unknown: {reason}"),
            Termination::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl fmt::Display for SynthesisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} solution(s); {}",
            self.solutions.len(),
            self.termination
        )?;
        for attempt in &self.attempts {
            match &attempt.rejected {
                Some(reason) => writeln!(f, "  length {}: rejected ({reason})", attempt.length)?,
                None => writeln!(
                    f,
                    "  length {}: {} solution(s), {} clauses, {} atoms",
                    attempt.length, attempt.solutions, attempt.clauses, attempt.atoms
                )?,
            }
        }
        for (i, solution) in self.solutions.iter().enumerate() {
            writeln!(f, "solution {} (length {}):", i + 1, solution.length)?;
            writeln!(f, "{solution}")?;
        }
        Ok(())
    }
}
