// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! smsd-core: shared model for the smsd message daemon

pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod message;
pub mod status;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{ConnectionError, DeviceError};
pub use event::{DaemonEvent, SendOutcome, EVENT_QUEUE_DEPTH};
pub use id::MessageId;
pub use message::{InboundMessage, InboundPart, NewOutbound, OutboundMessage, OutboundStatus};
pub use status::{
    BatteryCharge, ChargeState, DaemonStatus, SignalQuality, StatusDecodeError, STATUS_RECORD_LEN,
    STATUS_SCHEMA_VERSION,
};
