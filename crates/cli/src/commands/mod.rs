// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! CLI command implementations

pub mod check;
pub mod inbox;
pub mod inject;
pub mod queue;
pub mod status;
pub mod stop;

use crate::exit_error::ExitError;
use anyhow::Result;
use smsd_daemon::{PhoneConfig, SmsdConfig};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

/// Resolve `--phone`: an explicit name must exist, and omitting it is
/// only unambiguous with a single configured phone.
pub(crate) fn select_phone<'a>(
    cfg: &'a SmsdConfig,
    name: Option<&str>,
) -> Result<&'a PhoneConfig> {
    match name {
        Some(name) => Ok(cfg.phone_named(name)?),
        None if cfg.phones.len() == 1 => Ok(&cfg.phones[0]),
        None => Err(ExitError::usage(format!(
            "config declares {} phones; pick one with --phone",
            cfg.phones.len()
        ))
        .into()),
    }
}
