//! Process backends driven by small shell scripts standing in for real
//! solvers.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use synthflow_smt::backends::dimacs::to_dimacs;
use synthflow_smt::backends::dimacs_process::DimacsProcessSolver;
use synthflow_smt::backends::process::{ProcessError, SolverCommand};
use synthflow_smt::backends::smtlib_printer::to_smtlib_script;
use synthflow_smt::backends::smtlib_process::SmtLibProcessSolver;
use synthflow_smt::backends::BackendError;
use synthflow_smt::cnf::{Clause, CnfFormula, Literal};
use synthflow_smt::solver::{SatResult, SatSolver};

fn sample_formula() -> CnfFormula {
    let mut f = CnfFormula::new();
    f.add_clause(Clause::new([Literal::positive(1), Literal::positive(2)]).unwrap());
    f.add_clause(Clause::unit(Literal::negative(2)));
    f
}

/// Write `body` as a script that first copies its stdin to `input.txt`.
fn script(dir: &Path, body: &str) -> SolverCommand {
    let path = dir.join("solver.sh");
    let captured = dir.join("input.txt");
    fs::write(
        &path,
        format!("cat > '{}'\n{body}\n", captured.display()),
    )
    .unwrap();
    SolverCommand::new("sh", &[path.to_str().unwrap()])
}

fn captured_input(dir: &Path) -> String {
    fs::read_to_string(dir.join("input.txt")).unwrap()
}

#[test]
fn dimacs_solver_receives_cnf_and_returns_model() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = script(dir.path(), "printf 's SATISFIABLE\\nv 1 -2 0\\n'\nexit 10");
    let mut solver = DimacsProcessSolver::new(cmd);
    let formula = sample_formula();
    let (result, model) = solver.solve(&formula, Some(Duration::from_secs(10))).unwrap();
    assert_eq!(result, SatResult::Sat);
    assert_eq!(model.unwrap().true_atoms(), vec![1]);
    assert_eq!(captured_input(dir.path()), to_dimacs(&formula));
}

#[test]
fn dimacs_unsat_exit_code_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = script(dir.path(), "echo 's UNSATISFIABLE'\nexit 20");
    let (result, model) = DimacsProcessSolver::new(cmd)
        .solve(&sample_formula(), None)
        .unwrap();
    assert_eq!(result, SatResult::Unsat);
    assert!(model.is_none());
}

#[test]
fn dimacs_crash_is_a_process_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = script(dir.path(), "echo 'out of memory' >&2\nexit 1");
    let err = DimacsProcessSolver::new(cmd)
        .solve(&sample_formula(), None)
        .unwrap_err();
    match err {
        BackendError::Process(ProcessError::Failed { status, stderr, .. }) => {
            assert_eq!(status, "exit 1");
            assert_eq!(stderr, "out of memory");
        }
        other => panic!("expected a process failure, got {other:?}"),
    }
}

#[test]
fn smtlib_solver_receives_script_and_returns_model() {
    let dir = tempfile::tempdir().unwrap();
    let body = "echo sat\necho '((define-fun a1 () Bool true)'\necho ' (define-fun a2 () Bool false))'";
    let cmd = script(dir.path(), body);
    let mut solver = SmtLibProcessSolver::new(cmd);
    let formula = sample_formula();
    let (result, model) = solver.solve(&formula, None).unwrap();
    assert_eq!(result, SatResult::Sat);
    let model = model.unwrap();
    assert!(formula.is_satisfied_by(|a| model.value(a)));
    assert_eq!(captured_input(dir.path()), to_smtlib_script(&formula));
}

#[test]
fn smtlib_unknown_is_reported_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = script(dir.path(), "echo unknown");
    let (result, _) = SmtLibProcessSolver::new(cmd)
        .solve(&sample_formula(), None)
        .unwrap();
    assert!(matches!(result, SatResult::Unknown(_)));
}

#[test]
fn slow_solver_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = script(dir.path(), "exec sleep 10");
    let (result, model) = SmtLibProcessSolver::new(cmd)
        .solve(&sample_formula(), Some(Duration::from_millis(200)))
        .unwrap();
    assert_eq!(result, SatResult::Timeout);
    assert!(model.is_none());
}
