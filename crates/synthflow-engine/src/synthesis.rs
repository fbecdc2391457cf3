//! Iterative-deepening solve-and-enumerate loop.

use std::sync::atomic::{AtomicBool, Ordering};

use synthflow_ir::automaton::Automaton;
use synthflow_ir::domain::SynthesisDomain;
use synthflow_smt::arena::EncodingArena;
use synthflow_smt::cnf::{AtomId, CnfFormula};
use synthflow_smt::compiler::FormulaCompiler;
use synthflow_smt::encoder::encode_workflow;
use synthflow_smt::solver::{SatResult, SatSolver};
use tracing::{debug, info, warn};

use crate::options::SynthesisOptions;
use crate::result::{LengthAttempt, SynthesisError, SynthesisReport, Termination};
use crate::solution::{blocking_clause, decode_solution, BlockingPolicy, Solution};
use crate::timeout::{budget_spent, Deadline};

/// Search lengths `min_length..=max_length` in order, collecting up to
/// `solution_count` workflows.
pub fn synthesize<S: SatSolver>(
    solver: &mut S,
    domain: &SynthesisDomain,
    options: &SynthesisOptions,
) -> Result<SynthesisReport, SynthesisError> {
    synthesize_with_cancel(solver, domain, options, &AtomicBool::new(false))
}

/// As [`synthesize`], stopping before the next solver call once `cancel` is
/// set.
pub fn synthesize_with_cancel<S: SatSolver>(
    solver: &mut S,
    domain: &SynthesisDomain,
    options: &SynthesisOptions,
    cancel: &AtomicBool,
) -> Result<SynthesisReport, SynthesisError> {
    options.validate()?;
    let mut run = Run {
        solutions: Vec::new(),
        attempts: Vec::new(),
    };

    if domain.taxonomy.is_empty_library() {
        warn!("operation library is empty; no workflow can be synthesized");
        return Ok(run.finish(Termination::SearchExhausted));
    }

    let deadline = Deadline::from_timeout_secs(options.timeout_secs);
    let policy = options.encoding_policy();
    let blocking = options.blocking_policy();

    for length in options.min_length..=options.max_length {
        if cancel.load(Ordering::Relaxed) {
            return Ok(run.finish(Termination::Cancelled));
        }
        if deadline.expired() {
            info!(length, "{}", budget_spent("synthesis"));
            return Ok(run.finish(Termination::Timeout));
        }
        info!(length, "synthesis: trying workflow length");
        let mut attempt = LengthAttempt::new(length);

        let automaton = match Automaton::for_domain(domain, length) {
            Ok(automaton) => automaton,
            Err(err) => {
                warn!(length, error = %err, "synthesis: length rejected");
                attempt.rejected = Some(err.to_string());
                run.attempts.push(attempt);
                continue;
            }
        };
        let mut arena = EncodingArena::new();
        let mut formula = match encode_workflow(domain, &automaton, &mut arena, &policy) {
            Ok(encoding) => encoding.formula,
            Err(err) => {
                warn!(length, error = %err, "synthesis: length rejected");
                attempt.rejected = Some(err.to_string());
                run.attempts.push(attempt);
                continue;
            }
        };
        let mut compiler = FormulaCompiler::new(&domain.taxonomy, &automaton, &mut arena);
        formula.extend(compiler.compile_constraints(&domain.constraints)?);
        formula.reserve_atoms(arena.atoms.len() as AtomId);
        attempt.clauses = formula.len();
        attempt.atoms = arena.atoms.len();
        debug!(length, clauses = formula.len(), atoms = arena.atoms.len(), "synthesis: encoded");

        let step = enumerate(
            solver,
            domain,
            &automaton,
            &mut arena,
            &mut formula,
            options,
            blocking,
            deadline,
            cancel,
            &mut run,
            &mut attempt,
        );
        info!(length, solutions = attempt.solutions, "synthesis: length done");
        run.attempts.push(attempt);
        if let Some(termination) = step {
            return Ok(run.finish(termination));
        }
    }
    Ok(run.finish(Termination::SearchExhausted))
}

struct Run {
    solutions: Vec<Solution>,
    attempts: Vec<LengthAttempt>,
}

impl Run {
    fn finish(self, termination: Termination) -> SynthesisReport {
        info!(
            solutions = self.solutions.len(),
            termination = termination.kind(),
            "synthesis finished"
        );
        SynthesisReport {
            solutions: self.solutions,
            termination,
            attempts: self.attempts,
        }
    }
}

/// Solve and block until the length is exhausted (`None`) or the run must
/// stop.
#[allow(clippy::too_many_arguments)]
fn enumerate<S: SatSolver>(
    solver: &mut S,
    domain: &SynthesisDomain,
    automaton: &Automaton,
    arena: &mut EncodingArena,
    formula: &mut CnfFormula,
    options: &SynthesisOptions,
    blocking: BlockingPolicy,
    deadline: Deadline,
    cancel: &AtomicBool,
    run: &mut Run,
    attempt: &mut LengthAttempt,
) -> Option<Termination> {
    let length = automaton.length();
    loop {
        if run.solutions.len() >= options.solution_count {
            return Some(Termination::SolutionCountReached);
        }
        if cancel.load(Ordering::Relaxed) {
            return Some(Termination::Cancelled);
        }
        let timeout = deadline.remaining();
        if timeout.is_some_and(|t| t.is_zero()) {
            info!(length, "{}", budget_spent("synthesis"));
            return Some(Termination::Timeout);
        }

        attempt.solver_calls += 1;
        let (result, model) = match solver.solve(formula, timeout) {
            Ok(answer) => answer,
            Err(err) => {
                warn!(length, solver = solver.name(), error = %err, "synthesis: solver failed");
                return Some(Termination::SolverFailure(err.to_string()));
            }
        };
        match result {
            SatResult::Sat => {
                let Some(model) = model else {
                    warn!(length, "synthesis: solver returned SAT without a model");
                    return Some(Termination::SolverFailure(
                        "solver returned SAT without a model".into(),
                    ));
                };
                let solution = match decode_solution(domain, automaton, arena, &model) {
                    Ok(solution) => solution,
                    Err(err) => {
                        warn!(length, error = %err, "synthesis: unusable model");
                        return Some(Termination::SolverFailure(err.to_string()));
                    }
                };
                info!(
                    length,
                    found = run.solutions.len() + 1,
                    operations = ?solution.operations(),
                    "synthesis: solution found"
                );
                let clause = blocking_clause(&solution, arena, blocking);
                run.solutions.push(solution);
                attempt.solutions += 1;
                match clause {
                    Some(clause) => {
                        formula.add_clause(clause);
                    }
                    None => return None,
                }
            }
            SatResult::Unsat => {
                debug!(length, "synthesis: no further solutions at this length");
                return None;
            }
            SatResult::Timeout => {
                info!(length, "{}", budget_spent("solver call"));
                return Some(Termination::Timeout);
            }
            SatResult::Unknown(reason) => {
                warn!(length, %reason, "synthesis: solver returned unknown");
                return Some(Termination::Unknown(reason));
            }
        }
    }
}
