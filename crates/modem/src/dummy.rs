// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Dummy driver: a well-behaved phone made of thin air
//!
//! Accepts every message, never receives anything, and reports healthy
//! readings. Lets a full daemon setup be exercised with no hardware
//! attached.

use crate::driver::{
    segment_text, DeviceDriver, DeviceSession, MessageSegment, RawEvent, SegmentReceipt,
    CONCAT_SEGMENT_CHARS, SINGLE_SEGMENT_CHARS,
};
use async_trait::async_trait;
use smsd_core::{
    BatteryCharge, ChargeState, ConnectionError, DeviceError, OutboundMessage, SignalQuality,
};
use tracing::debug;

/// Identity reported by every dummy session.
pub const DUMMY_IMEI: &str = "490154203237518";

#[derive(Clone, Default)]
pub struct DummyDriver;

impl DummyDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceDriver for DummyDriver {
    async fn open(&self, locator: &str) -> Result<Box<dyn DeviceSession>, ConnectionError> {
        debug!(locator, "dummy device opened");
        Ok(Box::new(DummySession { reference: 0 }))
    }
}

struct DummySession {
    reference: u8,
}

#[async_trait]
impl DeviceSession for DummySession {
    async fn identity(&mut self) -> Result<String, DeviceError> {
        Ok(DUMMY_IMEI.to_string())
    }

    fn segment(&self, msg: &OutboundMessage) -> Vec<MessageSegment> {
        if msg.text.chars().count() <= SINGLE_SEGMENT_CHARS {
            vec![MessageSegment {
                seq: 1,
                total: 1,
                body: msg.text.clone(),
            }]
        } else {
            segment_text(&msg.text, CONCAT_SEGMENT_CHARS)
        }
    }

    async fn send_segment(
        &mut self,
        destination: &str,
        segment: &MessageSegment,
    ) -> Result<SegmentReceipt, DeviceError> {
        self.reference = self.reference.wrapping_add(1);
        debug!(
            destination,
            seq = segment.seq,
            total = segment.total,
            reference = self.reference,
            "dummy device accepted segment"
        );
        Ok(SegmentReceipt {
            reference: self.reference,
        })
    }

    async fn poll_events(&mut self, _max: usize) -> Result<Vec<RawEvent>, DeviceError> {
        Ok(Vec::new())
    }

    async fn sample_battery(&mut self) -> Result<BatteryCharge, DeviceError> {
        Ok(BatteryCharge {
            percent: 100,
            state: ChargeState::Full,
        })
    }

    async fn sample_signal(&mut self) -> Result<SignalQuality, DeviceError> {
        Ok(SignalQuality {
            percent: 76,
            dbm: -53,
        })
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "dummy_tests.rs"]
mod tests;
