// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Time source used by retry gates and receive timestamps.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, UNIX_EPOCH};

/// Two readings of the current time: a monotonic instant for waits and
/// a wall-clock millisecond count for persisted gates and timestamps.
pub trait Clock: Clone + Send + Sync {
    /// Monotonic reading.
    fn now(&self) -> Instant;
    /// Milliseconds since the unix epoch.
    fn epoch_ms(&self) -> u64;
}

/// The process clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        UNIX_EPOCH.elapsed().unwrap_or_default().as_millis() as u64
    }
}

/// Fake clock for testing. Time stands still until `advance` is called,
/// which makes retry gates and poll deadlines deterministic.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeNow>>,
}

struct FakeNow {
    instant: Instant,
    epoch_ms: u64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeNow {
                instant: Instant::now(),
                epoch_ms: 1_000_000,
            })),
        }
    }

    /// Advance both the monotonic and the wall reading by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.inner.lock();
        now.instant += duration;
        now.epoch_ms += duration.as_millis() as u64;
    }

    /// Pin the wall reading to an exact epoch millisecond value.
    pub fn set_epoch_ms(&self, ms: u64) {
        self.inner.lock().epoch_ms = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().instant
    }

    fn epoch_ms(&self) -> u64 {
        self.inner.lock().epoch_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
