//! Wall-clock budget of one synthesis run.

use std::time::{Duration, Instant};

/// Point in time after which no further solver call is started.
///
/// Built from `timeout_secs`, where zero means the run is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn unbounded() -> Self {
        Deadline(None)
    }

    pub(crate) fn after(budget: Duration) -> Self {
        Deadline(Instant::now().checked_add(budget))
    }

    pub(crate) fn from_timeout_secs(timeout_secs: u64) -> Self {
        match timeout_secs {
            0 => Self::unbounded(),
            secs => Self::after(Duration::from_secs(secs)),
        }
    }

    pub(crate) fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }

    /// Budget to hand to the next solver call: `None` when unbounded,
    /// `Some(ZERO)` once expired.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// Event message for a run or solver call stopped by its budget.
pub(crate) fn budget_spent(stage: &str) -> String {
    format!("{stage}: time budget spent")
}
