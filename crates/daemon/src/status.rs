// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Status channel.
//!
//! Each loop iteration publishes a [`DaemonStatus`] snapshot two ways: a
//! lock-free in-process cell for embedders, and (when configured) a
//! fixed-layout file replaced atomically so foreign processes can poll
//! counters and signal readings without any coordination.

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

use crate::config::PhoneConfig;
use arc_swap::ArcSwapOption;
use smsd_core::{DaemonStatus, StatusDecodeError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StatusReadError {
    /// The slot does not publish a status record.
    #[error("status channel not configured for this phone")]
    NotSupported,
    /// Publishing is configured but no record exists yet.
    #[error("no status record found (daemon not running?)")]
    NotAvailable,
    #[error(transparent)]
    Decode(#[from] StatusDecodeError),
    #[error("status read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Writer half of the status channel, owned by the delivery loop.
pub struct StatusPublisher {
    path: Option<PathBuf>,
    cell: Arc<ArcSwapOption<DaemonStatus>>,
}

impl StatusPublisher {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cell: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Reader handle over the in-process snapshot. Stays valid after the
    /// loop exits; it then reports the final flush.
    pub fn cell(&self) -> StatusCell {
        StatusCell {
            cell: Arc::clone(&self.cell),
        }
    }

    /// Publish a snapshot. File trouble is logged and swallowed: status
    /// is observability, and the loop must keep draining without it.
    pub fn publish(&self, status: &DaemonStatus) {
        self.cell.store(Some(Arc::new(status.clone())));
        let Some(path) = &self.path else { return };
        if let Err(e) = write_record(path, status) {
            warn!(path = %path.display(), error = %e, "status publish failed");
        }
    }
}

/// Lock-free reader over the most recent in-process snapshot.
#[derive(Clone)]
pub struct StatusCell {
    cell: Arc<ArcSwapOption<DaemonStatus>>,
}

impl StatusCell {
    pub fn latest(&self) -> Option<Arc<DaemonStatus>> {
        self.cell.load_full()
    }
}

// Readers must never observe a half-written record, so the bytes land in
// a sibling temp file first and rename into place.
fn write_record(path: &Path, status: &DaemonStatus) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(&status.encode())?;
    drop(file);
    fs::rename(&tmp, path)
}

/// Read the record the daemon publishes for `phone`.
pub fn read_status(phone: &PhoneConfig) -> Result<DaemonStatus, StatusReadError> {
    match &phone.status_path {
        None => Err(StatusReadError::NotSupported),
        Some(path) => read_status_file(path),
    }
}

/// Read and decode a status record straight from a path.
pub fn read_status_file(path: &Path) -> Result<DaemonStatus, StatusReadError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StatusReadError::NotAvailable)
        }
        Err(e) => return Err(e.into()),
    };
    Ok(DaemonStatus::decode(&bytes)?)
}
