//! Search budgets: iterations, wall clock and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;

/// Shared cancellation flag. Clones observe the same flag.
///
/// # Examples
///
/// ```
/// use u_logistics::local_search::CancelFlag;
///
/// let flag = CancelFlag::new();
/// let handle = flag.clone();
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The iteration budget ran out.
    IterationsExhausted,
    /// The wall-clock deadline passed.
    DeadlineReached,
    /// The cancel flag was raised.
    Cancelled,
    /// The draft admits no move.
    NoMoves,
}

/// Limits for one search call.
#[derive(Debug, Clone)]
pub struct Budget {
    max_iterations: usize,
    deadline: Option<Instant>,
    cancel: Option<CancelFlag>,
}

impl Budget {
    /// A budget of `max_iterations` with no deadline.
    pub fn iterations(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            deadline: None,
            cancel: None,
        }
    }

    /// Iteration and time limits taken from a search configuration. The
    /// deadline starts counting now.
    pub fn from_config(config: &SearchConfig) -> Self {
        let budget = Self::iterations(config.max_iterations);
        match config.time_limit() {
            Some(limit) => budget.with_time_limit(limit),
            None => budget,
        }
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `limit` from now.
    pub fn with_time_limit(self, limit: Duration) -> Self {
        self.with_deadline(Instant::now() + limit)
    }

    /// Attaches a cancellation flag.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Iteration budget.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Same deadline and flag with a different iteration budget.
    pub fn with_iterations(&self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self.clone()
        }
    }

    /// Returns the reason to stop early, if any.
    pub fn interrupted(&self) -> Option<StopReason> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Some(StopReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(StopReason::DeadlineReached);
        }
        None
    }
}
