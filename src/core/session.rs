//! State shared by one orchestration run.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Orchestrator lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    #[default]
    Idle,
    Validating,
    Enumerating,
    PerFile,
    Done,
    Cancelled,
}

/// How a run ended when it was not stopped by an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Completed { hits: usize },
    Cancelled { hits: usize },
}

impl ScanOutcome {
    pub fn hits(&self) -> usize {
        match self {
            ScanOutcome::Completed { hits } | ScanOutcome::Cancelled { hits } => *hits,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanOutcome::Cancelled { .. })
    }
}

/// Cancellation flag, running hit counter and lifecycle state of a run.
///
/// The flag is an `Arc<AtomicBool>` so a UI or signal handler can hold a clone
/// and stop the run from outside; the engine only polls it.
#[derive(Debug, Default)]
pub struct SearchSession {
    cancel_flag: Arc<AtomicBool>,
    hits: AtomicUsize,
    examined: AtomicUsize,
    state: Mutex<ScanState>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an externally owned cancellation flag.
    pub fn with_cancel_flag(cancel_flag: Arc<AtomicBool>) -> Self {
        Self {
            cancel_flag,
            ..Self::default()
        }
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Clears the flag, counters and state at the start of a run.
    pub fn reset(&self) {
        self.cancel_flag.store(false, Ordering::SeqCst);
        self.hits.store(0, Ordering::Relaxed);
        self.examined.store(0, Ordering::Relaxed);
        self.set_state(ScanState::Idle);
    }

    pub fn record_hit(&self) -> usize {
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_examined(&self) -> usize {
        self.examined.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn examined(&self) -> usize {
        self.examined.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> ScanState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_state(&self, state: ScanState) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *guard != state {
            tracing::debug!("Search state {:?} -> {:?}", *guard, state);
            *guard = state;
        }
    }
}
