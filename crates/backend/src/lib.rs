// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! smsd-backend: durable message spools
//!
//! The delivery loop talks to storage only through [`QueueBackend`], so a
//! deployment can swap the file spool for another store without touching
//! the loop.

use smsd_core::{InboundMessage, InboundPart, MessageId, NewOutbound, OutboundMessage};
use thiserror::Error;

pub mod spool;

pub use spool::SpoolBackend;

/// Errors surfaced by a queue backend.
///
/// IO failures mean the store itself is unusable; the daemon treats them as
/// fatal. A single damaged entry is not an IO failure and is quarantined
/// inside the backend instead.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("spool IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spool encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no such message: {0}")]
    NotFound(MessageId),
}

/// Capability surface the delivery loop needs from a message store.
///
/// Status transitions are atomic per message: an observer sees the old
/// record or the new one, never a half-written state. An accepted message
/// stays durable until it reaches a terminal state.
pub trait QueueBackend: Send + Sync {
    /// Durably accept a new outbound message. Returns the stored record
    /// only after it would survive a crash.
    fn insert_outbound(
        &self,
        new: NewOutbound,
        now_ms: u64,
    ) -> Result<OutboundMessage, BackendError>;

    /// Highest-priority pending message whose retry gate has passed,
    /// oldest first within a priority class.
    fn next_pending(&self, now_ms: u64) -> Result<Option<OutboundMessage>, BackendError>;

    /// Mark a message as handed to the device.
    fn mark_inflight(&self, id: &MessageId) -> Result<(), BackendError>;

    /// Terminal transition: the device accepted every segment.
    fn mark_sent(&self, id: &MessageId) -> Result<(), BackendError>;

    /// Terminal transition: abandoned. `error` records the final failure.
    fn mark_failed(&self, id: &MessageId, error: &str) -> Result<(), BackendError>;

    /// Return a message to pending with an updated failure count and a
    /// gate timestamp it must wait behind.
    fn defer(
        &self,
        id: &MessageId,
        attempts: u32,
        not_before_ms: u64,
        error: &str,
    ) -> Result<(), BackendError>;

    /// File one received fragment. Returns the assembled message once all
    /// fragments of its concatenation set are present.
    fn append_inbound(&self, part: InboundPart) -> Result<Option<InboundMessage>, BackendError>;

    /// Re-expose work interrupted by a crash. Returns how many messages
    /// went back to pending.
    fn recover(&self) -> Result<usize, BackendError>;

    /// Live outbox entries in delivery order.
    fn outbox(&self) -> Result<Vec<OutboundMessage>, BackendError>;

    /// Assembled inbox messages, oldest first.
    fn inbox(&self) -> Result<Vec<InboundMessage>, BackendError>;
}
