// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Daemon status record with a fixed cross-process layout
//!
//! The record is a little-endian byte layout so a reader built against the
//! same schema version can decode it without a serde dependency. The schema
//! version is the first field and is checked before anything else is
//! interpreted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version written into every record.
pub const STATUS_SCHEMA_VERSION: u32 = 1;

/// Max length of the identity strings, excluding the NUL terminator.
pub const STATUS_TEXT_LEN: usize = 100;

/// Max length of the IMEI string, excluding the NUL terminator.
pub const STATUS_IMEI_LEN: usize = 35;

/// Total encoded size of a status record.
pub const STATUS_RECORD_LEN: usize = 258;

const OFF_VERSION: usize = 0;
const OFF_PHONE_ID: usize = 4;
const OFF_CLIENT: usize = OFF_PHONE_ID + STATUS_TEXT_LEN + 1;
const OFF_BATTERY_PERCENT: usize = OFF_CLIENT + STATUS_TEXT_LEN + 1;
const OFF_CHARGE_STATE: usize = OFF_BATTERY_PERCENT + 1;
const OFF_SIGNAL_PERCENT: usize = OFF_CHARGE_STATE + 1;
const OFF_SIGNAL_DBM: usize = OFF_SIGNAL_PERCENT + 1;
const OFF_RECEIVED: usize = OFF_SIGNAL_DBM + 1;
const OFF_SENT: usize = OFF_RECEIVED + 4;
const OFF_FAILED: usize = OFF_SENT + 4;
const OFF_IMEI: usize = OFF_FAILED + 4;

/// Battery charging state as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeState {
    #[default]
    Unknown,
    Charging,
    Discharging,
    Full,
}

impl ChargeState {
    fn to_byte(self) -> u8 {
        match self {
            ChargeState::Unknown => 0,
            ChargeState::Charging => 1,
            ChargeState::Discharging => 2,
            ChargeState::Full => 3,
        }
    }

    fn from_byte(byte: u8) -> Self {
        match byte {
            1 => ChargeState::Charging,
            2 => ChargeState::Discharging,
            3 => ChargeState::Full,
            _ => ChargeState::Unknown,
        }
    }
}

/// Battery reading; `percent == UNKNOWN_PERCENT` means no reading yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryCharge {
    pub percent: u8,
    pub state: ChargeState,
}

impl BatteryCharge {
    pub const UNKNOWN_PERCENT: u8 = 0xff;

    pub fn unknown() -> Self {
        Self {
            percent: Self::UNKNOWN_PERCENT,
            state: ChargeState::Unknown,
        }
    }
}

impl Default for BatteryCharge {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Signal reading; sentinel values mark fields the device did not report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalQuality {
    pub percent: u8,
    pub dbm: i8,
}

impl SignalQuality {
    pub const UNKNOWN_PERCENT: u8 = 0xff;
    pub const UNKNOWN_DBM: i8 = 127;

    pub fn unknown() -> Self {
        Self {
            percent: Self::UNKNOWN_PERCENT,
            dbm: Self::UNKNOWN_DBM,
        }
    }
}

impl Default for SignalQuality {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Snapshot of one daemon slot, published once per loop iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub version: u32,
    pub phone_id: String,
    pub client: String,
    pub battery: BatteryCharge,
    pub signal: SignalQuality,
    pub received: u32,
    pub sent: u32,
    pub failed: u32,
    pub imei: String,
}

impl DaemonStatus {
    pub fn new(phone_id: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            version: STATUS_SCHEMA_VERSION,
            phone_id: phone_id.into(),
            client: client.into(),
            battery: BatteryCharge::unknown(),
            signal: SignalQuality::unknown(),
            received: 0,
            sent: 0,
            failed: 0,
            imei: String::new(),
        }
    }

    pub fn encode(&self) -> [u8; STATUS_RECORD_LEN] {
        let mut buf = [0u8; STATUS_RECORD_LEN];
        buf[OFF_VERSION..OFF_VERSION + 4].copy_from_slice(&self.version.to_le_bytes());
        put_str(&mut buf[OFF_PHONE_ID..OFF_CLIENT], &self.phone_id);
        put_str(&mut buf[OFF_CLIENT..OFF_BATTERY_PERCENT], &self.client);
        buf[OFF_BATTERY_PERCENT] = self.battery.percent;
        buf[OFF_CHARGE_STATE] = self.battery.state.to_byte();
        buf[OFF_SIGNAL_PERCENT] = self.signal.percent;
        buf[OFF_SIGNAL_DBM] = self.signal.dbm.to_le_bytes()[0];
        buf[OFF_RECEIVED..OFF_RECEIVED + 4].copy_from_slice(&self.received.to_le_bytes());
        buf[OFF_SENT..OFF_SENT + 4].copy_from_slice(&self.sent.to_le_bytes());
        buf[OFF_FAILED..OFF_FAILED + 4].copy_from_slice(&self.failed.to_le_bytes());
        put_str(&mut buf[OFF_IMEI..STATUS_RECORD_LEN], &self.imei);
        buf
    }

    /// Decode a record, checking the schema version before any other field.
    pub fn decode(bytes: &[u8]) -> Result<Self, StatusDecodeError> {
        if bytes.len() < 4 {
            return Err(StatusDecodeError::Truncated { len: bytes.len() });
        }
        let version = u32::from_le_bytes(read4(bytes, OFF_VERSION));
        if version != STATUS_SCHEMA_VERSION {
            return Err(StatusDecodeError::UnsupportedVersion(version));
        }
        if bytes.len() < STATUS_RECORD_LEN {
            return Err(StatusDecodeError::Truncated { len: bytes.len() });
        }
        Ok(Self {
            version,
            phone_id: get_str(&bytes[OFF_PHONE_ID..OFF_CLIENT]),
            client: get_str(&bytes[OFF_CLIENT..OFF_BATTERY_PERCENT]),
            battery: BatteryCharge {
                percent: bytes[OFF_BATTERY_PERCENT],
                state: ChargeState::from_byte(bytes[OFF_CHARGE_STATE]),
            },
            signal: SignalQuality {
                percent: bytes[OFF_SIGNAL_PERCENT],
                dbm: i8::from_le_bytes([bytes[OFF_SIGNAL_DBM]]),
            },
            received: u32::from_le_bytes(read4(bytes, OFF_RECEIVED)),
            sent: u32::from_le_bytes(read4(bytes, OFF_SENT)),
            failed: u32::from_le_bytes(read4(bytes, OFF_FAILED)),
            imei: get_str(&bytes[OFF_IMEI..STATUS_RECORD_LEN]),
        })
    }
}

/// NUL-padded write, truncating oversize values on a char boundary.
fn put_str(field: &mut [u8], value: &str) {
    let max = field.len() - 1;
    let mut end = value.len().min(max);
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    field[..end].copy_from_slice(&value.as_bytes()[..end]);
}

fn get_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn read4(bytes: &[u8], off: usize) -> [u8; 4] {
    [bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]]
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusDecodeError {
    #[error("status record truncated ({len} bytes)")]
    Truncated { len: usize },
    #[error("unsupported status schema version {0}")]
    UnsupportedVersion(u32),
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
