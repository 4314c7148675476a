// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Stop command handler

use anyhow::Result;
use smsd_daemon::{request_shutdown, ShutdownRequestError, SmsdConfig};

use crate::exit_error::ExitError;

pub fn handle(cfg: &SmsdConfig, phone: Option<&str>) -> Result<()> {
    let phone = super::select_phone(cfg, phone)?;
    match request_shutdown(phone) {
        Ok(()) => {
            println!("Stop requested for {}", phone.name);
            Ok(())
        }
        Err(ShutdownRequestError::NotRunning) => Err(ExitError::runtime(format!(
            "no daemon is running for phone {}",
            phone.name
        ))
        .into()),
        Err(e) => Err(e.into()),
    }
}
