// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Rendering helpers shared by the smsctl commands.

use clap::ValueEnum;
use smsd_core::{BatteryCharge, ChargeState, OutboundStatus, SignalQuality};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn status_label(status: OutboundStatus) -> &'static str {
    match status {
        OutboundStatus::Pending => "pending",
        OutboundStatus::InFlight => "in-flight",
        OutboundStatus::Sent => "sent",
        OutboundStatus::Failed => "failed",
    }
}

pub fn charge_state_label(state: ChargeState) -> &'static str {
    match state {
        ChargeState::Unknown => "unknown",
        ChargeState::Charging => "charging",
        ChargeState::Discharging => "discharging",
        ChargeState::Full => "full",
    }
}

/// "80% (discharging)", or "unknown" before the first reading.
pub fn battery_label(battery: &BatteryCharge) -> String {
    if battery.percent == BatteryCharge::UNKNOWN_PERCENT {
        return "unknown".to_string();
    }
    format!(
        "{}% ({})",
        battery.percent,
        charge_state_label(battery.state)
    )
}

/// "60% (-71 dBm)"; fields the device did not report are left out.
pub fn signal_label(signal: &SignalQuality) -> String {
    let percent_known = signal.percent != SignalQuality::UNKNOWN_PERCENT;
    let dbm_known = signal.dbm != SignalQuality::UNKNOWN_DBM;
    match (percent_known, dbm_known) {
        (true, true) => format!("{}% ({} dBm)", signal.percent, signal.dbm),
        (true, false) => format!("{}%", signal.percent),
        (false, true) => format!("{} dBm", signal.dbm),
        (false, false) => "unknown".to_string(),
    }
}

/// Format a millisecond epoch timestamp as UTC wall clock time.
pub fn format_epoch_ms(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    chrono::DateTime::from_timestamp_millis(epoch_ms as i64)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Clip `text` for one-line table cells, on a character boundary.
pub fn clip(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let kept: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
