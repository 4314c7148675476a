// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Inject command handler

use anyhow::Result;
use smsd_core::NewOutbound;
use smsd_daemon::{inject, InjectError, SmsdConfig};

use crate::exit_error::ExitError;
use crate::output::OutputFormat;

pub fn handle(
    cfg: &SmsdConfig,
    phone: Option<&str>,
    destination: String,
    text: String,
    priority: u8,
    format: OutputFormat,
) -> Result<()> {
    let phone = super::select_phone(cfg, phone)?;
    let new = NewOutbound::new(destination, text).with_priority(priority);

    let msg = match inject(phone, new) {
        Ok(msg) => msg,
        Err(InjectError::Backend(e)) => return Err(e.into()),
        Err(e) => return Err(ExitError::usage(e.to_string()).into()),
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "id": msg.id,
                    "phone": phone.name,
                    "destination": msg.destination,
                    "priority": msg.priority,
                }))?
            );
        }
        OutputFormat::Text => {
            println!("Queued {} for {}", msg.id, msg.destination);
        }
    }
    Ok(())
}
