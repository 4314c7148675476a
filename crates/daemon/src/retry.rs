// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Retry policy.
//!
//! Pure decisions: given what failed and how many attempts a message has
//! burned, say what the delivery loop should do next. No clocks, no IO,
//! no side effects, so the whole policy is table-testable.

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

use smsd_core::{ConnectionError, DeviceError};
use std::time::Duration;

/// Knobs for the retry policy, per phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Failed send attempts tolerated per message before it is abandoned.
    pub send_retries: u32,
    /// Base pause before a retried send; grows linearly with attempts.
    pub send_delay: Duration,
    /// Cap on the retry pause.
    pub max_delay: Duration,
    /// Low-level open attempts per connect cycle.
    pub connect_attempts: u32,
    /// Pause between connect cycles.
    pub connect_delay: Duration,
    /// Keep cycling connects forever instead of escalating to fatal.
    pub never_give_up: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            send_retries: 3,
            send_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(600),
            connect_attempts: 3,
            connect_delay: Duration::from_secs(10),
            never_give_up: false,
        }
    }
}

/// What failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A send attempt against an established session.
    Send(DeviceError),
    /// A whole connect cycle, after its low-level attempts were spent.
    Connect(ConnectionError),
}

/// What the loop should do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Try again after the pause.
    Retry(Duration),
    /// Give up on this message; the daemon keeps running.
    Abandon,
    /// The daemon cannot make progress on this device.
    Fatal,
}

/// Classify a failure. `attempts` counts completed failed attempts for
/// the message at hand, including the one being classified.
pub fn decide(kind: FailureKind, attempts: u32, cfg: &RetryConfig) -> Decision {
    match kind {
        // The device understood the message and said no. More attempts
        // would send the same bytes to the same answer.
        FailureKind::Send(DeviceError::DeviceRejected) => Decision::Abandon,
        FailureKind::Send(_) => {
            if attempts <= cfg.send_retries {
                Decision::Retry(send_delay(attempts, cfg))
            } else {
                Decision::Abandon
            }
        }
        FailureKind::Connect(_) => {
            if cfg.never_give_up {
                Decision::Retry(cfg.connect_delay)
            } else {
                Decision::Fatal
            }
        }
    }
}

/// Pause before the next send attempt: linear climb capped at `max_delay`.
pub fn send_delay(attempts: u32, cfg: &RetryConfig) -> Duration {
    cfg.send_delay.saturating_mul(attempts).min(cfg.max_delay)
}
