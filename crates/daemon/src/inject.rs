// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Injection gate.
//!
//! The one door for new outbound messages. Any process may inject while
//! the daemon runs; the spool is the synchronization point. Returns only
//! after the message is durably accepted, so a caller that gets an id
//! back can crash without losing the message.

#[cfg(test)]
#[path = "inject_tests.rs"]
mod tests;

use crate::config::PhoneConfig;
use smsd_backend::{BackendError, QueueBackend, SpoolBackend};
use smsd_core::{Clock, NewOutbound, OutboundMessage, SystemClock};
use thiserror::Error;
use tracing::info;

/// Longest destination accepted, in digits.
pub const MAX_DESTINATION_DIGITS: usize = 20;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("destination number is empty")]
    EmptyDestination,
    #[error("destination {0:?} is not a phone number")]
    InvalidDestination(String),
    #[error("payload of {len} characters exceeds the limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Validate and durably enqueue a message for `phone`.
pub fn inject(phone: &PhoneConfig, new: NewOutbound) -> Result<OutboundMessage, InjectError> {
    let backend = SpoolBackend::open(&phone.spool_dir)?;
    inject_with(&backend, phone, new, SystemClock.epoch_ms())
}

/// Enqueue through an already-open backend; the embedding path.
pub fn inject_with(
    backend: &dyn QueueBackend,
    phone: &PhoneConfig,
    mut new: NewOutbound,
    now_ms: u64,
) -> Result<OutboundMessage, InjectError> {
    new.destination = validate(&new, phone.max_payload_chars)?;
    let msg = backend.insert_outbound(new, now_ms)?;
    info!(
        phone = %phone.name,
        id = %msg.id,
        destination = %msg.destination,
        priority = msg.priority,
        "message injected"
    );
    Ok(msg)
}

/// Check plausibility and return the normalized destination.
fn validate(new: &NewOutbound, max_payload: usize) -> Result<String, InjectError> {
    let dest = new.destination.trim();
    if dest.is_empty() {
        return Err(InjectError::EmptyDestination);
    }
    let digits = dest.strip_prefix('+').unwrap_or(dest);
    let plausible = !digits.is_empty()
        && digits.len() <= MAX_DESTINATION_DIGITS
        && digits.bytes().all(|b| b.is_ascii_digit());
    if !plausible {
        return Err(InjectError::InvalidDestination(new.destination.clone()));
    }
    let len = new.text.chars().count();
    if len > max_payload {
        return Err(InjectError::PayloadTooLarge {
            len,
            max: max_payload,
        });
    }
    Ok(dest.to_string())
}
