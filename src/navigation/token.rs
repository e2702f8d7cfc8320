//! Cancellation tokens for in-flight navigations.
//!
//! # Design Decisions
//! - Each navigation owns one token; starting a new navigation flips the
//!   previous token to cancelled
//! - All in-flight work checks its token before publishing results
//! - Cooperative only: cancellation never aborts a running future, it
//!   makes its eventual result unobservable

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token owned by one navigation attempt.
#[derive(Debug, Clone)]
pub struct NavToken {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl NavToken {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Monotonic generation of the navigation this token belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Flip the token to cancelled. Idempotent.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once a newer navigation has superseded this one.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
