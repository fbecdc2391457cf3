use thiserror::Error;
use z3::ast::Bool;
use z3::SatResult as Z3SatResult;

use crate::cnf::{AtomId, CnfFormula};
use crate::solver::{Model, SatResult, SatSolver};

#[derive(Debug, Error)]
pub enum Z3Error {
    #[error("Z3 error: {0}")]
    Internal(String),
}

/// Z3 linked in process, enabled with the `z3` feature.
///
/// Each call asserts the whole formula into a fresh `z3::Solver`; the
/// timeout is passed to Z3 as its `timeout` parameter.
#[derive(Debug, Clone, Default)]
pub struct Z3Solver;

impl Z3Solver {
    pub fn new() -> Self {
        Self
    }
}

fn atom_name(atom: AtomId) -> String {
    format!("a{atom}")
}

impl SatSolver for Z3Solver {
    type Error = Z3Error;

    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<std::time::Duration>,
    ) -> Result<(SatResult, Option<Model>), Z3Error> {
        let solver = z3::Solver::new();
        if let Some(timeout) = timeout {
            let mut params = z3::Params::new();
            let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
            params.set_u32("timeout", timeout_ms.max(1));
            solver.set_params(&params);
        }

        let atoms: Vec<Bool> = (1..=formula.num_atoms())
            .map(|a| Bool::new_const(atom_name(a)))
            .collect();
        for clause in formula.clauses() {
            let literals: Vec<Bool> = clause
                .literals()
                .iter()
                .map(|lit| {
                    let atom = &atoms[(lit.atom() - 1) as usize];
                    if lit.is_positive() {
                        atom.clone()
                    } else {
                        atom.not()
                    }
                })
                .collect();
            let refs: Vec<&Bool> = literals.iter().collect();
            solver.assert(&Bool::or(&refs));
        }

        match solver.check() {
            Z3SatResult::Sat => {
                let z3_model = solver
                    .get_model()
                    .ok_or_else(|| Z3Error::Internal("SAT but no model available".into()))?;
                let mut model = Model::new();
                for (i, atom) in atoms.iter().enumerate() {
                    let value = z3_model
                        .eval::<Bool>(atom, true)
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    model.set(i as AtomId + 1, value);
                }
                Ok((SatResult::Sat, Some(model)))
            }
            Z3SatResult::Unsat => Ok((SatResult::Unsat, None)),
            Z3SatResult::Unknown => {
                let reason = solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "Z3 returned unknown".into());
                if reason.contains("timeout") || reason.contains("canceled") {
                    Ok((SatResult::Timeout, None))
                } else {
                    Ok((SatResult::Unknown(reason), None))
                }
            }
        }
    }

    fn name(&self) -> &str {
        "z3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::{Clause, Literal};

    #[test]
    fn solves_small_formulas() {
        let mut f = CnfFormula::new();
        f.add_clause(Clause::new([Literal::positive(1), Literal::positive(2)]).unwrap());
        f.add_clause(Clause::unit(Literal::negative(1)));
        let (result, model) = Z3Solver::new().solve(&f, None).unwrap();
        assert_eq!(result, SatResult::Sat);
        assert_eq!(model.unwrap().true_atoms(), vec![2]);

        f.add_clause(Clause::unit(Literal::negative(2)));
        assert_eq!(Z3Solver::new().solve(&f, None).unwrap().0, SatResult::Unsat);
    }

    #[test]
    fn empty_clause_is_unsat() {
        let mut f = CnfFormula::new();
        f.add_clause(Clause::empty());
        assert_eq!(Z3Solver::new().solve(&f, None).unwrap().0, SatResult::Unsat);
    }
}
