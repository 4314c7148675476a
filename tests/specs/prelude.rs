// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Shared harness for the workspace specs.
//!
//! A [`Deployment`] is a throwaway state dir with one or more phone
//! slots configured against the dummy driver, with intervals short
//! enough to run in real time. Specs start slots through the same
//! `run_slot` path the binaries use and assert on the artifacts other
//! processes would read.

pub use smsd_backend::{QueueBackend, SpoolBackend};
pub use smsd_core::{DaemonEvent, NewOutbound, OutboundMessage, OutboundStatus, SendOutcome};
pub use smsd_daemon::{
    acquire_slot, event_channel, inject, pid_path, read_status_file, request_shutdown, run_all,
    run_slot, stop_path, InjectError, LifecycleError, PhoneConfig, RetryConfig, RunOptions,
    ShutdownFlag, ShutdownRequestError, ShutdownState, SlotError, SmsdConfig,
};
pub use std::time::Duration;

use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Upper bound for anything a spec waits on.
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Poll `cond` until it holds or `max_ms` elapse.
pub async fn wait_for(max_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

pub struct Deployment {
    _root: TempDir,
    config: SmsdConfig,
}

impl Deployment {
    pub fn single_phone() -> Self {
        Self::with_phones(&["primary"])
    }

    pub fn with_phones(names: &[&str]) -> Self {
        let root = TempDir::new().expect("temp dir");
        let state_dir = root.path().join("state");
        let phones = names
            .iter()
            .enumerate()
            .map(|(slot, name)| {
                let run_dir = state_dir.join(name);
                PhoneConfig {
                    slot,
                    name: (*name).to_string(),
                    phone_id: format!("{name}-phone"),
                    client: "smsd specs".to_string(),
                    device: format!("dummy:{slot}"),
                    driver: "dummy".to_string(),
                    spool_dir: run_dir.join("spool"),
                    status_path: Some(run_dir.join("status")),
                    run_dir,
                    poll_interval: Duration::from_millis(5),
                    retry: RetryConfig {
                        send_retries: 2,
                        send_delay: Duration::from_millis(10),
                        max_delay: Duration::from_millis(50),
                        connect_attempts: 2,
                        connect_delay: Duration::from_millis(5),
                        never_give_up: false,
                    },
                    max_payload_chars: 1530,
                    disconnect_timeout: Duration::from_millis(200),
                }
            })
            .collect();
        let config = SmsdConfig {
            path: state_dir.join("smsd.toml"),
            state_dir,
            log_path: None,
            phones,
        };
        Self {
            _root: root,
            config,
        }
    }

    pub fn config(&self) -> &SmsdConfig {
        &self.config
    }

    pub fn phone(&self) -> &PhoneConfig {
        &self.config.phones[0]
    }

    pub fn phone_at(&self, slot: usize) -> &PhoneConfig {
        &self.config.phones[slot]
    }

    /// Fresh backend handle over slot 0's spool, the way another
    /// process would open it.
    pub fn spool(&self) -> SpoolBackend {
        SpoolBackend::open(&self.phone().spool_dir).expect("open spool")
    }

    pub fn spool_count(&self, dir: &str) -> usize {
        file_count(&self.phone().spool_dir.join(dir))
    }

    pub fn archived(&self, dir: &str) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        let path = self.phone().spool_dir.join(dir);
        if let Ok(entries) = std::fs::read_dir(path) {
            for entry in entries.filter_map(|e| e.ok()) {
                if entry.path().extension().is_some_and(|e| e == "json") {
                    let bytes = std::fs::read(entry.path()).expect("read archive");
                    out.push(serde_json::from_slice(&bytes).expect("parse archive"));
                }
            }
        }
        out
    }

    /// Start slot 0 in the background with default options.
    pub fn start(&self) -> RunningSlot {
        self.start_with(RunOptions::default())
    }

    pub fn start_with(&self, mut opts: RunOptions) -> RunningSlot {
        let flag = opts.flag.take().unwrap_or_default();
        opts.flag = Some(flag.clone());
        let cfg = self.config.clone();
        let task = tokio::spawn(async move { run_slot(&cfg, 0, opts).await });
        RunningSlot { flag, task }
    }
}

pub fn file_count(path: &Path) -> usize {
    match std::fs::read_dir(path) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .count(),
        Err(_) => 0,
    }
}

/// A slot running as a background task, stoppable through its flag.
pub struct RunningSlot {
    pub flag: ShutdownFlag,
    task: JoinHandle<Result<(), SlotError>>,
}

impl RunningSlot {
    /// Trip the flag and wait for the slot to wind down.
    pub async fn stop(self) -> Result<(), SlotError> {
        self.flag.request();
        self.join().await
    }

    pub async fn join(self) -> Result<(), SlotError> {
        timeout(Duration::from_millis(SPEC_WAIT_MAX_MS), self.task)
            .await
            .expect("slot should stop in time")
            .expect("slot task panicked")
    }
}
