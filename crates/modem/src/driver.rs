// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Device driver seam
//!
//! A driver knows how to reach one kind of phone hardware; a session is an
//! established link to one device. Every session operation carries its own
//! deadline inside the driver: a call either completes or fails within a
//! bounded time, it never hangs the caller.

use async_trait::async_trait;
use smsd_core::{
    BatteryCharge, ConnectionError, DeviceError, InboundPart, OutboundMessage, SignalQuality,
};

/// Chars that fit a single unsegmented message.
pub const SINGLE_SEGMENT_CHARS: usize = 160;

/// Chars per segment once a message needs concatenation headers.
pub const CONCAT_SEGMENT_CHARS: usize = 153;

/// One protocol-level segment of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSegment {
    pub seq: u8,
    pub total: u8,
    pub body: String,
}

/// Device acknowledgement for one accepted segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentReceipt {
    /// Device-assigned reference, echoed later by delivery reports.
    pub reference: u8,
}

/// Unsolicited device activity drained by `poll_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    /// A received message fragment (single-part messages have total == 1).
    Message(InboundPart),

    /// Network delivery report for an earlier send.
    StatusReport { reference: u8, delivered: bool },

    /// Voice call activity.
    Call { number: String },

    /// Cell broadcast page.
    Broadcast { channel: u16, body: String },

    /// Network-initiated USSD notification.
    Ussd { body: String },
}

/// Factory for device sessions.
#[async_trait]
pub trait DeviceDriver: Send + Sync + 'static {
    /// Open a session against the device at `locator`.
    async fn open(&self, locator: &str) -> Result<Box<dyn DeviceSession>, ConnectionError>;
}

/// An established link to one device.
///
/// A session that returns [`DeviceError::LinkLost`] is dead; callers must
/// drop it and open a new one.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Device identity (IMEI or equivalent serial).
    async fn identity(&mut self) -> Result<String, DeviceError>;

    /// Split a message into protocol segments. Never returns empty.
    fn segment(&self, msg: &OutboundMessage) -> Vec<MessageSegment>;

    /// Hand one segment to the device and wait for its acknowledgement.
    async fn send_segment(
        &mut self,
        destination: &str,
        segment: &MessageSegment,
    ) -> Result<SegmentReceipt, DeviceError>;

    /// Drain up to `max` already-queued device events without waiting for
    /// new ones.
    async fn poll_events(&mut self, max: usize) -> Result<Vec<RawEvent>, DeviceError>;

    async fn sample_battery(&mut self) -> Result<BatteryCharge, DeviceError>;

    async fn sample_signal(&mut self) -> Result<SignalQuality, DeviceError>;

    /// Release the device. The session is invalid afterwards.
    async fn close(&mut self) -> Result<(), DeviceError>;
}

/// Split `text` into numbered segments of at most `size` chars.
///
/// Always yields at least one segment and at most 255; payloads are bounded
/// upstream by the injection gate before they can hit that cap.
pub fn segment_text(text: &str, size: usize) -> Vec<MessageSegment> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut bodies: Vec<String> = chars.chunks(size).map(|c| c.iter().collect()).collect();
    if bodies.is_empty() {
        bodies.push(String::new());
    }
    bodies.truncate(255);
    let total = bodies.len() as u8;
    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| MessageSegment {
            seq: (i + 1) as u8,
            total,
            body,
        })
        .collect()
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
