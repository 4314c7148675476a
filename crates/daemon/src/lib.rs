// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! smsd-daemon: the delivery daemon.
//!
//! The delivery loop lives in [`scheduler`]; [`lifecycle::run_slot`]
//! wires a configured slot to drivers, locks, stop files, and signals.
//! Everything is usable as a library: an embedder builds a config,
//! subscribes to events over a bounded channel, and drives slots inside
//! its own runtime. The `smsdd` binary is a thin wrapper over
//! [`lifecycle::run_all`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod inject;
pub mod lifecycle;
pub mod retry;
pub mod scheduler;
pub mod shutdown;
pub mod status;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{read_config, ConfigError, PhoneConfig, SmsdConfig};
pub use inject::{inject, inject_with, InjectError};
pub use lifecycle::{
    acquire_slot, pid_path, request_shutdown, run_all, run_named, run_slot, stop_path,
    LifecycleError, RunLock, RunOptions, ShutdownRequestError, SlotError,
};
pub use retry::{decide, send_delay, Decision, FailureKind, RetryConfig};
pub use scheduler::{event_channel, FatalError, LoopState, Scheduler};
pub use shutdown::{ShutdownFlag, ShutdownState};
pub use status::{
    read_status, read_status_file, StatusCell, StatusPublisher, StatusReadError,
};
