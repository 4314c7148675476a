// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Events forwarded to an embedding subscriber
//!
//! Consumers receive these over a bounded channel; the delivery loop never
//! blocks on a slow subscriber.

use crate::id::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default bounded depth of a daemon event channel.
pub const EVENT_QUEUE_DEPTH: usize = 10;

/// Outcome reported for a previously injected message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendOutcome {
    /// Accepted by the device.
    Sent,
    /// Abandoned after exhausting retries or being rejected.
    Failed,
    /// Confirmed delivered by a network status report.
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonEvent {
    /// A fully assembled message was filed into the inbox.
    #[serde(rename = "incoming:message")]
    IncomingMessage {
        id: MessageId,
        sender: String,
        body: String,
        received_at: DateTime<Utc>,
    },

    #[serde(rename = "incoming:call")]
    IncomingCall { number: String },

    #[serde(rename = "incoming:broadcast")]
    IncomingBroadcast { channel: u16, body: String },

    #[serde(rename = "incoming:ussd")]
    IncomingUssd { body: String },

    #[serde(rename = "send:status")]
    SendStatus {
        id: MessageId,
        outcome: SendOutcome,
        #[serde(default)]
        error: Option<String>,
    },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
