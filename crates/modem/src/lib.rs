// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! smsd-modem: device drivers and connection management

pub mod connection;
pub mod driver;
pub mod dummy;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use connection::{ConnectSettings, ConnectionHandle, ConnectionManager, DeliveryResult};
pub use driver::{
    segment_text, DeviceDriver, DeviceSession, MessageSegment, RawEvent, SegmentReceipt,
    CONCAT_SEGMENT_CHARS, SINGLE_SEGMENT_CHARS,
};
pub use dummy::{DummyDriver, DUMMY_IMEI};
#[cfg(any(test, feature = "test-support"))]
pub use mock::MockDriver;
