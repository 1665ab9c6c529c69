//! Wall-clock utilities for naming captures.
//!
//! Exported photos are named after the Unix epoch in milliseconds at the
//! moment of capture. Within one session the clock never hands out the same
//! or an earlier value twice, so captures taken inside the same millisecond
//! (or across a backwards system clock step) still sort and never overwrite
//! each other.

use std::sync::atomic::{AtomicI64, Ordering};

/// Current wall-clock time as Unix epoch milliseconds.
pub fn epoch_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Session clock handing out strictly increasing epoch milliseconds.
#[derive(Debug, Default)]
pub struct CaptureClock {
    last_ms: AtomicI64,
}

impl CaptureClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next capture timestamp, read from the system clock.
    pub fn next_millis(&self) -> i64 {
        self.next_after(epoch_millis_now())
    }

    /// Next capture timestamp given an observed wall-clock reading.
    ///
    /// Returns `observed_ms` unless it is not greater than the last value
    /// handed out, in which case the last value plus one is returned. Readings
    /// before the epoch count as 0, so values are never negative.
    pub fn next_after(&self, observed_ms: i64) -> i64 {
        let observed_ms = observed_ms.max(0);
        let mut last = self.last_ms.load(Ordering::SeqCst);
        loop {
            let next = observed_ms.max(last.saturating_add(1));
            match self
                .last_ms
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Last value handed out, or 0 before the first capture.
    pub fn last_millis(&self) -> i64 {
        self.last_ms.load(Ordering::SeqCst)
    }
}
