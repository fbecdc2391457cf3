//! DIMACS CNF printing and SAT-competition output parsing.

use std::fmt::Write;

use thiserror::Error;

use crate::cnf::{CnfFormula, Literal};
use crate::solver::{Model, SatResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimacsError {
    #[error("solver output has no status line")]
    MissingStatus,
    #[error("unexpected solver status '{0}'")]
    UnexpectedStatus(String),
    #[error("invalid literal '{0}' in model line")]
    InvalidLiteral(String),
}

/// Print `formula` in DIMACS CNF.
pub fn to_dimacs(formula: &CnfFormula) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "p cnf {} {}", formula.num_atoms(), formula.len());
    for clause in formula.clauses() {
        for lit in clause.literals() {
            let _ = write!(out, "{} ", lit.to_dimacs());
        }
        out.push_str("0\n");
    }
    out
}

/// Parse solver output in the SAT-competition format (`s` status line,
/// `v` value lines, `c` comments).
pub fn parse_solver_output(output: &str) -> Result<(SatResult, Option<Model>), DimacsError> {
    let mut status = None;
    let mut model = Model::new();
    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("s ") {
            status = Some(match rest.trim() {
                "SATISFIABLE" => SatResult::Sat,
                "UNSATISFIABLE" => SatResult::Unsat,
                "UNKNOWN" | "INDETERMINATE" => {
                    SatResult::Unknown("solver reported UNKNOWN".into())
                }
                other => return Err(DimacsError::UnexpectedStatus(other.to_string())),
            });
        } else if let Some(rest) = line.strip_prefix('v') {
            for token in rest.split_whitespace() {
                let value: i32 = token
                    .parse()
                    .map_err(|_| DimacsError::InvalidLiteral(token.to_string()))?;
                if value == 0 {
                    break;
                }
                let lit = Literal::from_dimacs(value)
                    .ok_or_else(|| DimacsError::InvalidLiteral(token.to_string()))?;
                model.set(lit.atom(), lit.is_positive());
            }
        }
    }
    match status {
        Some(SatResult::Sat) => Ok((SatResult::Sat, Some(model))),
        Some(other) => Ok((other, None)),
        None => Err(DimacsError::MissingStatus),
    }
}
