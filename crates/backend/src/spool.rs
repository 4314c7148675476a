// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! File-spool backend
//!
//! Directory layout under the spool root:
//!
//! ```text
//! outbox/        live outbound records (pending / inflight)
//! sent/          terminal: accepted by the device
//! error/         terminal: abandoned
//! inbox/         assembled received messages
//! inbox/parts/   fragments waiting for the rest of their message
//! ```
//!
//! Records are JSON files named by message id. Every write lands in a temp
//! file and is moved into place with a rename, so a concurrent reader sees
//! the old record or the new one, never a torn write. Other processes (the
//! injector CLI) share a spool safely on that basis: only the daemon moves
//! records between directories.

use crate::{BackendError, QueueBackend};
use chrono::{DateTime, Utc};
use smsd_core::{
    InboundMessage, InboundPart, MessageId, NewOutbound, OutboundMessage, OutboundStatus,
};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct SpoolBackend {
    root: PathBuf,
    outbox: PathBuf,
    sent: PathBuf,
    error: PathBuf,
    inbox: PathBuf,
    parts: PathBuf,
}

impl SpoolBackend {
    /// Open a spool rooted at `root`, creating the layout if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        let inbox = root.join("inbox");
        let backend = Self {
            outbox: root.join("outbox"),
            sent: root.join("sent"),
            error: root.join("error"),
            parts: inbox.join("parts"),
            inbox,
            root,
        };
        for dir in [
            &backend.outbox,
            &backend.sent,
            &backend.error,
            &backend.parts,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(backend)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn outbox_path(&self, id: &MessageId) -> PathBuf {
        self.outbox.join(format!("{id}.json"))
    }

    fn load_outbox(&self, id: &MessageId) -> Result<OutboundMessage, BackendError> {
        let path = self.outbox_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(msg) => Ok(msg),
            Err(e) => {
                quarantine(&path, &e);
                Err(BackendError::NotFound(id.clone()))
            }
        }
    }

    /// Archive a terminal record and drop its outbox entry.
    fn finalize(&self, msg: OutboundMessage) -> Result<(), BackendError> {
        let dir = if msg.status == OutboundStatus::Sent {
            &self.sent
        } else {
            &self.error
        };
        write_json(&dir.join(format!("{}.json", msg.id)), &msg, true)?;
        fs::remove_file(self.outbox_path(&msg.id))?;
        Ok(())
    }

    fn file_inbound(
        &self,
        sender: String,
        body: String,
        received_at: DateTime<Utc>,
        parts: u8,
    ) -> Result<InboundMessage, BackendError> {
        let msg = InboundMessage {
            id: MessageId::generate(),
            sender,
            body,
            received_at,
            parts,
        };
        write_json(&self.inbox.join(format!("{}.json", msg.id)), &msg, true)?;
        debug!(id = %msg.id, sender = %msg.sender, parts = msg.parts, "inbound message filed");
        Ok(msg)
    }

    /// Assemble a concatenation set once every seq `1..=total` is present.
    fn try_assemble(
        &self,
        sender: &str,
        reference: u16,
        total: u8,
    ) -> Result<Option<InboundMessage>, BackendError> {
        let key = part_key(sender, reference);
        let mut parts: Vec<InboundPart> = Vec::new();
        for entry in fs::read_dir(&self.parts)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&key) || !name.ends_with(".json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            match serde_json::from_slice::<InboundPart>(&bytes) {
                Ok(part) => parts.push(part),
                Err(e) => quarantine(&path, &e),
            }
        }

        let mut have = vec![false; total as usize];
        for part in &parts {
            if (1..=total).contains(&part.seq) {
                have[usize::from(part.seq - 1)] = true;
            }
        }
        if !have.iter().all(|&h| h) {
            return Ok(None);
        }

        parts.sort_by_key(|p| p.seq);
        parts.dedup_by_key(|p| p.seq);
        let body: String = parts.iter().map(|p| p.body.as_str()).collect();
        let received_at = parts[0].received_at;
        let assembled = self.file_inbound(sender.to_string(), body, received_at, total)?;
        for seq in 1..=total {
            let _ = fs::remove_file(self.parts.join(part_file(&key, seq)));
        }
        Ok(Some(assembled))
    }
}

impl QueueBackend for SpoolBackend {
    fn insert_outbound(
        &self,
        new: NewOutbound,
        now_ms: u64,
    ) -> Result<OutboundMessage, BackendError> {
        let msg = OutboundMessage {
            id: MessageId::generate(),
            destination: new.destination,
            text: new.text,
            priority: new.priority,
            status: OutboundStatus::Pending,
            attempts: 0,
            not_before_ms: 0,
            created_at_ms: now_ms,
            last_error: None,
        };
        write_json(&self.outbox_path(&msg.id), &msg, true)?;
        debug!(id = %msg.id, destination = %msg.destination, "outbound message accepted");
        Ok(msg)
    }

    fn next_pending(&self, now_ms: u64) -> Result<Option<OutboundMessage>, BackendError> {
        let mut due: Vec<OutboundMessage> = read_records(&self.outbox)?
            .into_iter()
            .filter(|m: &OutboundMessage| m.is_due(now_ms))
            .collect();
        due.sort_by(delivery_order);
        Ok(due.into_iter().next())
    }

    fn mark_inflight(&self, id: &MessageId) -> Result<(), BackendError> {
        let mut msg = self.load_outbox(id)?;
        msg.status = OutboundStatus::InFlight;
        // Losing this marker in a crash is safe: recovery returns the
        // message to pending, so no durability barrier here.
        write_json(&self.outbox_path(id), &msg, false)
    }

    fn mark_sent(&self, id: &MessageId) -> Result<(), BackendError> {
        let mut msg = self.load_outbox(id)?;
        msg.status = OutboundStatus::Sent;
        msg.last_error = None;
        self.finalize(msg)
    }

    fn mark_failed(&self, id: &MessageId, error: &str) -> Result<(), BackendError> {
        let mut msg = self.load_outbox(id)?;
        msg.status = OutboundStatus::Failed;
        msg.last_error = Some(error.to_string());
        self.finalize(msg)
    }

    fn defer(
        &self,
        id: &MessageId,
        attempts: u32,
        not_before_ms: u64,
        error: &str,
    ) -> Result<(), BackendError> {
        let mut msg = self.load_outbox(id)?;
        msg.status = OutboundStatus::Pending;
        msg.attempts = attempts;
        msg.not_before_ms = not_before_ms;
        msg.last_error = Some(error.to_string());
        write_json(&self.outbox_path(id), &msg, false)
    }

    fn append_inbound(&self, part: InboundPart) -> Result<Option<InboundMessage>, BackendError> {
        if !part.is_well_formed() {
            warn!(
                sender = %part.sender,
                seq = part.seq,
                total = part.total,
                "dropping malformed inbound fragment"
            );
            return Ok(None);
        }
        if part.total == 1 {
            return self
                .file_inbound(part.sender, part.body, part.received_at, 1)
                .map(Some);
        }
        let reference = part.reference.unwrap_or(0);
        let key = part_key(&part.sender, reference);
        // Duplicate fragments overwrite their predecessor, which keeps
        // redelivery by the device idempotent.
        write_json(&self.parts.join(part_file(&key, part.seq)), &part, true)?;
        self.try_assemble(&part.sender, reference, part.total)
    }

    fn recover(&self) -> Result<usize, BackendError> {
        for dir in [&self.outbox, &self.sent, &self.error, &self.inbox, &self.parts] {
            remove_stale_tmp(dir)?;
        }

        let mut reexposed = 0;
        for entry in fs::read_dir(&self.outbox)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            let mut msg: OutboundMessage = match serde_json::from_slice(&bytes) {
                Ok(msg) => msg,
                Err(e) => {
                    quarantine(&path, &e);
                    continue;
                }
            };
            // A terminal copy means the crash hit between the archive
            // write and the outbox cleanup; the archive wins.
            let name = format!("{}.json", msg.id);
            if self.sent.join(&name).exists() || self.error.join(&name).exists() {
                fs::remove_file(&path)?;
                continue;
            }
            if msg.status == OutboundStatus::InFlight {
                msg.status = OutboundStatus::Pending;
                msg.not_before_ms = 0;
                write_json(&path, &msg, false)?;
                reexposed += 1;
            }
        }
        if reexposed > 0 {
            debug!(count = reexposed, "re-exposed interrupted sends");
        }
        Ok(reexposed)
    }

    fn outbox(&self) -> Result<Vec<OutboundMessage>, BackendError> {
        let mut items: Vec<OutboundMessage> = read_records(&self.outbox)?;
        items.sort_by(delivery_order);
        Ok(items)
    }

    fn inbox(&self) -> Result<Vec<InboundMessage>, BackendError> {
        let mut items: Vec<InboundMessage> = read_records(&self.inbox)?;
        items.sort_by(|a, b| a.received_at.cmp(&b.received_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }
}

/// Higher priority first, then oldest first, then id for determinism.
fn delivery_order(a: &OutboundMessage, b: &OutboundMessage) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(a.created_at_ms.cmp(&b.created_at_ms))
        .then(a.id.cmp(&b.id))
}

/// Write JSON beside `path` and move it into place with a rename.
fn write_json<T: serde::Serialize>(
    path: &Path,
    value: &T,
    durable: bool,
) -> Result<(), BackendError> {
    let tmp = path.with_extension("tmp");
    let data = serde_json::to_vec_pretty(value)?;
    let mut file = File::create(&tmp)?;
    file.write_all(&data)?;
    if durable {
        file.sync_all()?;
    }
    drop(file);
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_records<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>, BackendError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.extension().is_some_and(|e| e == "json") {
            continue;
        }
        let bytes = fs::read(&path)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => out.push(value),
            Err(e) => quarantine(&path, &e),
        }
    }
    Ok(out)
}

/// Park an unreadable entry out of the scan path instead of failing the
/// whole spool over one bad file.
fn quarantine(path: &Path, err: &serde_json::Error) {
    warn!(path = %path.display(), error = %err, "quarantining unreadable spool entry");
    let mut corrupt = path.as_os_str().to_owned();
    corrupt.push(".corrupt");
    let _ = fs::rename(path, PathBuf::from(corrupt));
}

fn remove_stale_tmp(dir: &Path) -> Result<(), BackendError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "tmp") {
            let _ = fs::remove_file(&path);
        }
    }
    Ok(())
}

/// Fragments group by sender and concatenation reference; the sender is
/// hashed so arbitrary numbers stay filesystem-safe.
fn part_key(sender: &str, reference: u16) -> String {
    let mut hasher = DefaultHasher::new();
    sender.hash(&mut hasher);
    format!("{:016x}-r{:05}", hasher.finish(), reference)
}

fn part_file(key: &str, seq: u8) -> String {
    format!("{key}-p{seq:03}.json")
}

#[cfg(test)]
#[path = "spool_tests.rs"]
mod tests;
