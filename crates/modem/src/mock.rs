// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Scriptable in-memory driver for tests
//!
//! Scripts are consumed per call; an empty script means the call succeeds.
//! Driver and sessions share one state cell, so scripts keep applying
//! across reconnects and the test can inspect activity after handing the
//! driver to a delivery loop.

use crate::driver::{
    segment_text, DeviceDriver, DeviceSession, MessageSegment, RawEvent, SegmentReceipt,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use smsd_core::{
    BatteryCharge, ChargeState, ConnectionError, DeviceError, OutboundMessage, SignalQuality,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct MockState {
    open_script: VecDeque<Result<(), ConnectionError>>,
    send_script: VecDeque<Result<(), DeviceError>>,
    poll_script: VecDeque<DeviceError>,
    battery_script: VecDeque<Result<BatteryCharge, DeviceError>>,
    signal_script: VecDeque<Result<SignalQuality, DeviceError>>,
    event_batches: VecDeque<Vec<RawEvent>>,
    identity: String,
    segment_chars: usize,
    close_delay: Duration,
    open_calls: u32,
    close_calls: u32,
    send_log: Vec<(String, MessageSegment)>,
    next_reference: u8,
}

#[derive(Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        let state = MockState {
            identity: "001010123456789".to_string(),
            segment_chars: 20,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    // ── Scripting ────────────────────────────────────────────────────────

    pub fn script_open(&self, result: Result<(), ConnectionError>) {
        self.state.lock().open_script.push_back(result);
    }

    pub fn script_send(&self, result: Result<(), DeviceError>) {
        self.state.lock().send_script.push_back(result);
    }

    pub fn script_poll_error(&self, error: DeviceError) {
        self.state.lock().poll_script.push_back(error);
    }

    pub fn script_battery(&self, result: Result<BatteryCharge, DeviceError>) {
        self.state.lock().battery_script.push_back(result);
    }

    pub fn script_signal(&self, result: Result<SignalQuality, DeviceError>) {
        self.state.lock().signal_script.push_back(result);
    }

    pub fn queue_events(&self, events: Vec<RawEvent>) {
        self.state.lock().event_batches.push_back(events);
    }

    pub fn set_identity(&self, imei: impl Into<String>) {
        self.state.lock().identity = imei.into();
    }

    /// Segment size used by sessions; small by default so short test
    /// strings still exercise multi-segment sends.
    pub fn set_segment_chars(&self, chars: usize) {
        self.state.lock().segment_chars = chars;
    }

    pub fn set_close_delay(&self, delay: Duration) {
        self.state.lock().close_delay = delay;
    }

    // ── Inspection ───────────────────────────────────────────────────────

    pub fn open_calls(&self) -> u32 {
        self.state.lock().open_calls
    }

    pub fn close_calls(&self) -> u32 {
        self.state.lock().close_calls
    }

    pub fn sent(&self) -> Vec<(String, MessageSegment)> {
        self.state.lock().send_log.clone()
    }

    pub fn sent_bodies(&self) -> Vec<String> {
        self.state
            .lock()
            .send_log
            .iter()
            .map(|(_, segment)| segment.body.clone())
            .collect()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceDriver for MockDriver {
    async fn open(&self, _locator: &str) -> Result<Box<dyn DeviceSession>, ConnectionError> {
        let mut state = self.state.lock();
        state.open_calls += 1;
        match state.open_script.pop_front() {
            Some(Err(e)) => Err(e),
            _ => Ok(Box::new(MockSession {
                state: self.state.clone(),
            })),
        }
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl DeviceSession for MockSession {
    async fn identity(&mut self) -> Result<String, DeviceError> {
        Ok(self.state.lock().identity.clone())
    }

    fn segment(&self, msg: &OutboundMessage) -> Vec<MessageSegment> {
        let chars = self.state.lock().segment_chars;
        segment_text(&msg.text, chars)
    }

    async fn send_segment(
        &mut self,
        destination: &str,
        segment: &MessageSegment,
    ) -> Result<SegmentReceipt, DeviceError> {
        let mut state = self.state.lock();
        match state.send_script.pop_front() {
            Some(Err(e)) => Err(e),
            _ => {
                state
                    .send_log
                    .push((destination.to_string(), segment.clone()));
                state.next_reference = state.next_reference.wrapping_add(1);
                Ok(SegmentReceipt {
                    reference: state.next_reference,
                })
            }
        }
    }

    async fn poll_events(&mut self, max: usize) -> Result<Vec<RawEvent>, DeviceError> {
        let mut state = self.state.lock();
        if let Some(e) = state.poll_script.pop_front() {
            return Err(e);
        }
        match state.event_batches.pop_front() {
            Some(mut batch) => {
                if batch.len() > max {
                    let rest = batch.split_off(max);
                    state.event_batches.push_front(rest);
                }
                Ok(batch)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn sample_battery(&mut self) -> Result<BatteryCharge, DeviceError> {
        match self.state.lock().battery_script.pop_front() {
            Some(result) => result,
            None => Ok(BatteryCharge {
                percent: 100,
                state: ChargeState::Full,
            }),
        }
    }

    async fn sample_signal(&mut self) -> Result<SignalQuality, DeviceError> {
        match self.state.lock().signal_script.pop_front() {
            Some(result) => result,
            None => Ok(SignalQuality {
                percent: 80,
                dbm: -60,
            }),
        }
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        let delay = {
            let mut state = self.state.lock();
            state.close_calls += 1;
            state.close_delay
        };
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
