// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Daemon configuration.
//!
//! One TOML file configures every phone slot: a `[smsd]` table for
//! daemon-wide settings and one `[phone.<name>]` table per attached
//! device. Section order assigns slot indexes, so slot numbering is
//! stable across restarts as long as the file does not reorder.
//!
//! Raw serde structs absorb the file; validation resolves defaults and
//! relative paths into a [`SmsdConfig`] the rest of the daemon trusts.

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

use crate::env;
use crate::retry::RetryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Client string reported in status records when the config gives none.
pub const DEFAULT_CLIENT: &str = concat!("smsd ", env!("CARGO_PKG_VERSION"));

/// Drivers the daemon can instantiate.
pub const KNOWN_DRIVERS: &[&str] = &["dummy"];

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_PAYLOAD_CHARS: usize = 1530;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("phone {name}: {source}")]
    PhoneSection {
        name: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("config declares no [phone.<name>] sections")]
    NoPhones,
    #[error("phone name {0:?} cannot be used as a directory name")]
    BadPhoneName(String),
    #[error("phone {name}: device locator is empty")]
    EmptyDevice { name: String },
    #[error("phone {name}: unknown driver {driver:?}")]
    UnknownDriver { name: String, driver: String },
    #[error("phone {name}: {field} must be greater than zero")]
    ZeroInterval { name: String, field: &'static str },
    #[error("could not determine a state directory")]
    NoStateDir,
    #[error("no phone slot {0}")]
    NoSuchSlot(usize),
    #[error("no phone named {0:?}")]
    NoSuchPhone(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    smsd: RawGeneral,
    #[serde(default)]
    phone: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGeneral {
    state_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPhone {
    device: String,
    driver: Option<String>,
    phone_id: Option<String>,
    client: Option<String>,
    spool: Option<PathBuf>,
    status_file: Option<PathBuf>,
    publish_status: Option<bool>,
    poll_interval_ms: Option<u64>,
    send_retries: Option<u32>,
    send_retry_delay_ms: Option<u64>,
    max_retry_delay_ms: Option<u64>,
    connect_attempts: Option<u32>,
    connect_retry_delay_ms: Option<u64>,
    never_give_up: Option<bool>,
    max_payload_chars: Option<usize>,
    disconnect_timeout_ms: Option<u64>,
}

/// Validated daemon configuration.
#[derive(Debug, Clone)]
pub struct SmsdConfig {
    /// File the config was loaded from.
    pub path: PathBuf,
    /// Root for everything the daemon writes.
    pub state_dir: PathBuf,
    /// Log destination; `None` means stderr.
    pub log_path: Option<PathBuf>,
    /// Phone slots in file order.
    pub phones: Vec<PhoneConfig>,
}

/// One validated phone slot.
#[derive(Debug, Clone)]
pub struct PhoneConfig {
    pub slot: usize,
    pub name: String,
    /// Identity string published in status records.
    pub phone_id: String,
    /// Client string published in status records.
    pub client: String,
    /// Device locator handed to the driver.
    pub device: String,
    pub driver: String,
    /// Runtime files for this slot: pid file, stop file, status record.
    pub run_dir: PathBuf,
    pub spool_dir: PathBuf,
    /// `None` turns the file-based status channel off.
    pub status_path: Option<PathBuf>,
    pub poll_interval: Duration,
    pub retry: RetryConfig,
    /// Longest accepted outbound payload, in characters.
    pub max_payload_chars: usize,
    pub disconnect_timeout: Duration,
}

impl SmsdConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        validate(path.to_path_buf(), raw)
    }

    pub fn phone(&self, slot: usize) -> Result<&PhoneConfig, ConfigError> {
        self.phones.get(slot).ok_or(ConfigError::NoSuchSlot(slot))
    }

    pub fn phone_named(&self, name: &str) -> Result<&PhoneConfig, ConfigError> {
        self.phones
            .iter()
            .find(|phone| phone.name == name)
            .ok_or_else(|| ConfigError::NoSuchPhone(name.to_string()))
    }
}

/// Load a config file, reporting the outcome through the log when
/// `uselog` is set. Unattended starts want the failure on record, not
/// just in a dead process's stderr.
pub fn read_config(path: impl AsRef<Path>, uselog: bool) -> Result<SmsdConfig, ConfigError> {
    let path = path.as_ref();
    match SmsdConfig::load(path) {
        Ok(cfg) => {
            if uselog {
                info!(path = %path.display(), phones = cfg.phones.len(), "configuration loaded");
            }
            Ok(cfg)
        }
        Err(e) => {
            if uselog {
                error!(path = %path.display(), error = %e, "configuration rejected");
            }
            Err(e)
        }
    }
}

fn validate(path: PathBuf, raw: RawConfig) -> Result<SmsdConfig, ConfigError> {
    let state_dir = env::state_dir_override()
        .or(raw.smsd.state_dir)
        .or_else(env::default_state_dir)
        .ok_or(ConfigError::NoStateDir)?;
    let log_path = raw.smsd.log_file.map(|p| resolve(&state_dir, p));

    if raw.phone.is_empty() {
        return Err(ConfigError::NoPhones);
    }

    let mut phones = Vec::with_capacity(raw.phone.len());
    for (slot, (name, value)) in raw.phone.into_iter().enumerate() {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::BadPhoneName(name));
        }
        let rp: RawPhone = value.try_into().map_err(|source| ConfigError::PhoneSection {
            name: name.clone(),
            source,
        })?;
        phones.push(validate_phone(slot, name, rp, &state_dir)?);
    }

    Ok(SmsdConfig {
        path,
        state_dir,
        log_path,
        phones,
    })
}

fn validate_phone(
    slot: usize,
    name: String,
    rp: RawPhone,
    state_dir: &Path,
) -> Result<PhoneConfig, ConfigError> {
    if rp.device.trim().is_empty() {
        return Err(ConfigError::EmptyDevice { name });
    }
    let driver = rp.driver.unwrap_or_else(|| "dummy".to_string());
    if !KNOWN_DRIVERS.contains(&driver.as_str()) {
        return Err(ConfigError::UnknownDriver { name, driver });
    }

    let poll_interval = env::poll_interval_override()
        .or(rp.poll_interval_ms.map(Duration::from_millis))
        .unwrap_or(DEFAULT_POLL_INTERVAL);
    if poll_interval.is_zero() {
        return Err(ConfigError::ZeroInterval {
            name,
            field: "poll_interval_ms",
        });
    }
    let disconnect_timeout = rp
        .disconnect_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DISCONNECT_TIMEOUT);
    if disconnect_timeout.is_zero() {
        return Err(ConfigError::ZeroInterval {
            name,
            field: "disconnect_timeout_ms",
        });
    }

    let defaults = RetryConfig::default();
    let retry = RetryConfig {
        send_retries: rp.send_retries.unwrap_or(defaults.send_retries),
        send_delay: rp
            .send_retry_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.send_delay),
        max_delay: rp
            .max_retry_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_delay),
        connect_attempts: rp
            .connect_attempts
            .unwrap_or(defaults.connect_attempts)
            .max(1),
        connect_delay: rp
            .connect_retry_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.connect_delay),
        never_give_up: rp.never_give_up.unwrap_or(false),
    };

    let run_dir = state_dir.join(&name);
    let spool_dir = resolve(&run_dir, rp.spool.unwrap_or_else(|| PathBuf::from("spool")));
    let status_path = if rp.publish_status.unwrap_or(true) {
        Some(resolve(
            &run_dir,
            rp.status_file.unwrap_or_else(|| PathBuf::from("status")),
        ))
    } else {
        None
    };

    Ok(PhoneConfig {
        slot,
        phone_id: rp.phone_id.unwrap_or_else(|| name.clone()),
        client: rp.client.unwrap_or_else(|| DEFAULT_CLIENT.to_string()),
        device: rp.device,
        driver,
        run_dir,
        spool_dir,
        status_path,
        poll_interval,
        retry,
        max_payload_chars: rp.max_payload_chars.unwrap_or(DEFAULT_MAX_PAYLOAD_CHARS),
        disconnect_timeout,
        name,
    })
}

fn resolve(base: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
