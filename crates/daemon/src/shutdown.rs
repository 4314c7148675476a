// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Cooperative shutdown.
//!
//! Every phone slot carries a tri-state flag: running, shutdown requested,
//! terminated. Requests are idempotent and one-way. The embedded
//! cancellation token wakes any sleeping wait the moment a request lands,
//! so an idle loop reacts immediately instead of at its next poll tick.

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::info;

const RUNNING: u8 = 0;
const REQUESTED: u8 = 1;
const TERMINATED: u8 = 2;

/// Where a slot is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShutdownRequested,
    Terminated,
}

/// Shared shutdown flag for one delivery loop. Clones observe the same
/// state.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    state: Arc<AtomicU8>,
    token: CancellationToken,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RUNNING)),
            token: CancellationToken::new(),
        }
    }

    /// Request shutdown. Returns true for the transition out of Running,
    /// false when a request already landed or the loop is done.
    pub fn request(&self) -> bool {
        let first = self
            .state
            .compare_exchange(RUNNING, REQUESTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first {
            self.token.cancel();
        }
        first
    }

    /// True once a request landed or the loop terminated.
    pub fn is_requested(&self) -> bool {
        self.state.load(Ordering::SeqCst) != RUNNING
    }

    /// Recorded by the loop itself after its final flush. Terminated is
    /// absorbing; later requests are no-ops.
    pub fn mark_terminated(&self) {
        self.state.store(TERMINATED, Ordering::SeqCst);
        self.token.cancel();
    }

    pub fn state(&self) -> ShutdownState {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => ShutdownState::Running,
            REQUESTED => ShutdownState::ShutdownRequested,
            _ => ShutdownState::Terminated,
        }
    }

    /// Resolves when shutdown is requested. Usable inside `select!` arms.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll for an operator stop file and trip the flag when it appears.
/// Returns once the flag trips for any reason.
pub async fn watch_stop_file(path: PathBuf, flag: ShutdownFlag, interval: Duration) {
    loop {
        if path.exists() {
            info!(path = %path.display(), "stop file detected");
            flag.request();
            return;
        }
        tokio::select! {
            _ = flag.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
