//! Per-stage call counters.
//!
//! A [`Timings`] accumulates the number of calls and the total wall clock
//! spent in one pipeline stage. Updates are two relaxed atomic adds, so any
//! number of threads can record into the same instance without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Call count and total elapsed nanoseconds for one stage.
#[derive(Debug, Default)]
pub struct Timings {
    num_calls: AtomicU64,
    total_ns: AtomicU64,
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call that took `elapsed`.
    pub fn record_call(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.num_calls.fetch_add(1, Ordering::Relaxed);
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn num_calls(&self) -> u64 {
        self.num_calls.load(Ordering::Relaxed)
    }

    pub fn total_ns(&self) -> u64 {
        self.total_ns.load(Ordering::Relaxed)
    }

    /// Mean duration per call, zero when nothing was recorded.
    pub fn average(&self) -> Duration {
        self.snapshot().average()
    }

    /// A point-in-time copy for reporting.
    pub fn snapshot(&self) -> TimingSnapshot {
        TimingSnapshot {
            num_calls: self.num_calls(),
            total_ns: self.total_ns(),
        }
    }
}

/// Plain copy of a [`Timings`] taken for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimingSnapshot {
    pub num_calls: u64,
    pub total_ns: u64,
}

impl TimingSnapshot {
    pub fn average(&self) -> Duration {
        match self.total_ns.checked_div(self.num_calls) {
            Some(avg) => Duration::from_nanos(avg),
            None => Duration::ZERO,
        }
    }
}
