//! One-shot solver subprocesses with a kill-on-timeout deadline.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn solver '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("solver I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("solver '{program}' failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Executable plus arguments of an external solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SolverCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// How a solver run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Finished {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    /// The deadline passed; the process was killed.
    TimedOut,
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut out = String::new();
        if let Some(mut reader) = reader {
            let _ = reader.read_to_string(&mut out);
        }
        out
    })
}

/// A running solver as seen by the polling loop.
trait Reap {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill_and_reap(&mut self);
}

impl Reap for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill_and_reap(&mut self) {
        let _ = self.kill();
        let _ = self.wait();
    }
}

/// Poll until the child exits. `Ok(None)` means the deadline passed. The
/// child is killed and reaped before returning `Ok(None)` or an error.
fn await_exit<C: Reap>(
    child: &mut C,
    deadline: Option<Instant>,
) -> io::Result<Option<ExitStatus>> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(err) => {
                child.kill_and_reap();
                return Err(err);
            }
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            child.kill_and_reap();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run `command`, feed `input` on stdin and collect its output.
///
/// Stdin is written and stdout/stderr are drained on helper threads so a
/// chatty solver cannot block on a full pipe. The child is polled until it
/// exits or `timeout` elapses, in which case it is killed.
pub fn run_solver(
    command: &SolverCommand,
    input: String,
    timeout: Option<Duration>,
) -> Result<ProcessOutcome, ProcessError> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: command.program.clone(),
            source,
        })?;
    debug!(program = %command.program, bytes = input.len(), "spawned solver");

    let stdin = child.stdin.take();
    let writer = thread::spawn(move || {
        if let Some(mut stdin) = stdin {
            // A solver may exit before reading everything.
            let _ = stdin.write_all(input.as_bytes());
        }
    });
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = timeout.map(|t| Instant::now() + t);
    let status = match await_exit(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => {
            debug!(program = %command.program, "solver killed after timeout");
            return Ok(ProcessOutcome::TimedOut);
        }
        Err(err) => {
            debug!(program = %command.program, error = %err, "solver killed after failed status poll");
            return Err(err.into());
        }
    };

    let _ = writer.join();
    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();
    Ok(ProcessOutcome::Finished {
        stdout,
        stderr,
        exit_code: status.code(),
    })
}
