//! Process-wide request counters.
//!
//! One [`Counters`] is built at startup and handed (behind an `Arc`) to every
//! middleware that reports into it. All fields are atomics: increments from
//! concurrently running requests are never lost.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Counters {
    requests: AtomicU64,
    errors: AtomicU64,
    panics: AtomicU64,
    active_tasks: AtomicU64,
}

/// Point-in-time copy of [`Counters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub requests: u64,
    pub errors: u64,
    pub panics: u64,
    pub active_tasks: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new request count.
    pub fn increment_requests(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn increment_errors(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn increment_panics(&self) -> u64 {
        self.panics.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Gauge of live runtime tasks.
    pub fn set_active_tasks(&self, n: u64) {
        self.active_tasks.store(n, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 { self.requests.load(Ordering::Relaxed) }
    pub fn errors(&self) -> u64 { self.errors.load(Ordering::Relaxed) }
    pub fn panics(&self) -> u64 { self.panics.load(Ordering::Relaxed) }
    pub fn active_tasks(&self) -> u64 { self.active_tasks.load(Ordering::Relaxed) }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            requests: self.requests(),
            errors: self.errors(),
            panics: self.panics(),
            active_tasks: self.active_tasks(),
        }
    }
}
