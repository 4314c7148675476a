// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Centralized access to the environment variables the daemon honors.

use std::path::PathBuf;
use std::time::Duration;

/// Config file location: `SMSD_CONFIG`, falling back to `/etc/smsd.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("SMSD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/smsd.toml"))
}

/// State directory override: `SMSD_STATE_DIR` wins over the config file.
pub fn state_dir_override() -> Option<PathBuf> {
    std::env::var("SMSD_STATE_DIR").ok().map(PathBuf::from)
}

/// Fallback state directory when neither the environment nor the config
/// file names one: `$XDG_STATE_HOME/smsd`, then `~/.local/state/smsd`.
pub fn default_state_dir() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("smsd"));
        }
    }
    dirs::home_dir().map(|home| home.join(".local").join("state").join("smsd"))
}

/// Poll interval override in milliseconds: `SMSD_POLL_MS`. Applies to
/// every configured phone; meant for tests and bring-up, not production.
pub fn poll_interval_override() -> Option<Duration> {
    std::env::var("SMSD_POLL_MS")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
