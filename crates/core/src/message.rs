// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Message records shared by the queue backend and the delivery loop

use crate::id::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of an outbound message.
///
/// `Pending` and `InFlight` live in the outbox; `Sent` and `Failed` are
/// terminal and move to the archive directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundStatus {
    Pending,
    InFlight,
    Sent,
    Failed,
}

impl OutboundStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutboundStatus::Sent | OutboundStatus::Failed)
    }
}

/// A queued outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: MessageId,
    pub destination: String,
    pub text: String,
    #[serde(default)]
    pub priority: u8,
    pub status: OutboundStatus,
    /// Completed send attempts that failed.
    #[serde(default)]
    pub attempts: u32,
    /// Epoch ms before which the message must not be offered for delivery.
    #[serde(default)]
    pub not_before_ms: u64,
    pub created_at_ms: u64,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl OutboundMessage {
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.status == OutboundStatus::Pending && self.not_before_ms <= now_ms
    }
}

/// Parameters for injecting a new outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOutbound {
    pub destination: String,
    pub text: String,
    #[serde(default)]
    pub priority: u8,
}

impl NewOutbound {
    pub fn new(destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            text: text.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

/// One received fragment as reported by the device.
///
/// Single-part messages arrive as `seq == 1, total == 1` with no
/// concatenation reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundPart {
    pub sender: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    /// Concatenation reference shared by every part of one message.
    #[serde(default)]
    pub reference: Option<u16>,
    pub seq: u8,
    pub total: u8,
}

impl InboundPart {
    pub fn single(
        sender: impl Into<String>,
        body: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            received_at,
            reference: None,
            seq: 1,
            total: 1,
        }
    }

    /// Part numbering is one-based and must fit inside the declared total.
    pub fn is_well_formed(&self) -> bool {
        self.total >= 1 && self.seq >= 1 && self.seq <= self.total
    }
}

/// A fully assembled received message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    pub sender: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    /// Number of fragments the message arrived in.
    pub parts: u8,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
