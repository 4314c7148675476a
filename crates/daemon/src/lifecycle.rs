// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Slot lifecycle: run directories, locks, startup and teardown.
//!
//! Every phone slot owns a run directory under the state dir holding its
//! pid file, stop file, status record, and spool. The pid file carries an
//! exclusive advisory lock for as long as the slot runs, so a second
//! daemon instance fails fast instead of fighting over the device.

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

use crate::config::{PhoneConfig, SmsdConfig};
use crate::scheduler::{FatalError, Scheduler};
use crate::shutdown::{watch_stop_file, ShutdownFlag};
use crate::status::StatusPublisher;
use fs2::FileExt;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use smsd_backend::SpoolBackend;
use smsd_core::{DaemonEvent, SystemClock};
use smsd_modem::DummyDriver;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another daemon holds {path}: {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ShutdownRequestError {
    #[error("no daemon is running for this phone")]
    NotRunning,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that can stop a slot from running to completion.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

pub fn pid_path(phone: &PhoneConfig) -> PathBuf {
    phone.run_dir.join("smsd.pid")
}

pub fn stop_path(phone: &PhoneConfig) -> PathBuf {
    phone.run_dir.join("smsd.stop")
}

/// Exclusive slot lock, held for the lifetime of the value.
pub struct RunLock {
    // NOTE(lifetime): held to keep the advisory lock; released on drop
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

/// Create the run directory, take the slot lock, and record our pid.
pub fn acquire_slot(phone: &PhoneConfig) -> Result<RunLock, LifecycleError> {
    std::fs::create_dir_all(&phone.run_dir)?;
    let path = pid_path(phone);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&path)?;
    file.try_lock_exclusive()
        .map_err(|source| LifecycleError::LockFailed {
            path: path.clone(),
            source,
        })?;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(RunLock { file, path })
}

impl RunLock {
    /// Remove the slot's runtime files on a graceful exit. The lock is
    /// still held while they go away, so no new instance races us.
    pub fn release(self, phone: &PhoneConfig) {
        let _ = std::fs::remove_file(stop_path(phone));
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Ask a running slot to shut down by dropping its stop file. The pid
/// file is probed first so a stale lock does not masquerade as a daemon.
pub fn request_shutdown(phone: &PhoneConfig) -> Result<(), ShutdownRequestError> {
    let pid = read_pid(&pid_path(phone)).ok_or(ShutdownRequestError::NotRunning)?;
    if !process_alive(pid) {
        return Err(ShutdownRequestError::NotRunning);
    }
    std::fs::write(stop_path(phone), b"stop\n")?;
    info!(phone = %phone.name, pid, "shutdown requested");
    Ok(())
}

fn read_pid(path: &Path) -> Option<i32> {
    let text = std::fs::read_to_string(path).ok()?;
    text.trim().parse().ok()
}

// Signal 0 probes liveness without delivering anything.
fn process_alive(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Options for running a slot.
pub struct RunOptions {
    /// Treat fatal device errors as a reason to exit the slot.
    pub exit_on_failure: bool,
    /// Subscriber for daemon events.
    pub events: Option<mpsc::Sender<DaemonEvent>>,
    /// External shutdown flag; one is created when absent.
    pub flag: Option<ShutdownFlag>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            exit_on_failure: true,
            events: None,
            flag: None,
        }
    }
}

/// Run one phone slot to termination.
pub async fn run_slot(cfg: &SmsdConfig, slot: usize, opts: RunOptions) -> Result<(), SlotError> {
    let phone = cfg.phone(slot)?.clone();
    let lock = acquire_slot(&phone)?;
    // A stop file left over from an earlier run must not kill us at birth.
    let _ = std::fs::remove_file(stop_path(&phone));

    let flag = opts.flag.unwrap_or_default();
    let backend = Arc::new(SpoolBackend::open(&phone.spool_dir).map_err(FatalError::Backend)?);
    let publisher = StatusPublisher::new(phone.status_path.clone());
    let watcher = tokio::spawn(watch_stop_file(
        stop_path(&phone),
        flag.clone(),
        phone.poll_interval,
    ));

    info!(
        phone = %phone.name,
        device = %phone.device,
        driver = %phone.driver,
        spool = %phone.spool_dir.display(),
        "slot starting"
    );
    // Config validation pins the driver set; "dummy" is the only
    // in-tree driver today.
    let scheduler = Scheduler::new(
        phone.clone(),
        backend,
        DummyDriver::new(),
        SystemClock,
        flag.clone(),
        publisher,
        opts.events,
        opts.exit_on_failure,
    );
    let result = scheduler.run().await;

    watcher.abort();
    lock.release(&phone);
    match &result {
        Ok(()) => info!(phone = %phone.name, "slot stopped"),
        Err(e) => warn!(phone = %phone.name, error = %e, "slot terminated"),
    }
    result.map_err(SlotError::from)
}

/// Run a single named slot until it terminates. SIGTERM and SIGINT
/// request shutdown just as they do for the full set.
pub async fn run_named(cfg: &SmsdConfig, name: &str, exit_on_failure: bool) -> Result<(), SlotError> {
    let slot = cfg.phone_named(name)?.slot;
    let flag = ShutdownFlag::new();
    let signals = tokio::spawn(forward_signals(vec![flag.clone()]));
    let result = run_slot(
        cfg,
        slot,
        RunOptions {
            exit_on_failure,
            events: None,
            flag: Some(flag),
        },
    )
    .await;
    signals.abort();
    result
}

/// Run every configured slot until all terminate. SIGTERM and SIGINT
/// fan out to each slot's shutdown flag. Returns the first slot error.
pub async fn run_all(cfg: &SmsdConfig, exit_on_failure: bool) -> Result<(), SlotError> {
    let mut flags = Vec::with_capacity(cfg.phones.len());
    let mut slots = tokio::task::JoinSet::new();
    for phone in &cfg.phones {
        let flag = ShutdownFlag::new();
        flags.push(flag.clone());
        let cfg = cfg.clone();
        let slot = phone.slot;
        slots.spawn(async move {
            run_slot(
                &cfg,
                slot,
                RunOptions {
                    exit_on_failure,
                    events: None,
                    flag: Some(flag),
                },
            )
            .await
        });
    }
    let signals = tokio::spawn(forward_signals(flags.clone()));

    let mut first_err = None;
    while let Some(joined) = slots.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
                // One slot going down hard takes its siblings with it.
                if exit_on_failure {
                    for flag in &flags {
                        flag.request();
                    }
                }
            }
            Err(e) => warn!(error = %e, "slot task panicked"),
        }
    }
    signals.abort();
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn forward_signals(flags: Vec<ShutdownFlag>) {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "cannot install SIGTERM handler");
            return;
        }
    };
    let mut int = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "cannot install SIGINT handler");
            return;
        }
    };
    tokio::select! {
        _ = term.recv() => info!("SIGTERM received"),
        _ = int.recv() => info!("SIGINT received"),
    }
    for flag in &flags {
        flag.request();
    }
}
