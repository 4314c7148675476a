// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Status command handler

use anyhow::Result;
use smsd_core::DaemonStatus;
use smsd_daemon::{read_status, PhoneConfig, SmsdConfig, StatusReadError};
use std::time::Duration;

use crate::exit_error::ExitError;
use crate::output::{battery_label, signal_label, OutputFormat};

pub async fn handle(
    cfg: &SmsdConfig,
    phone: Option<&str>,
    format: OutputFormat,
    watch: bool,
) -> Result<()> {
    let phone = super::select_phone(cfg, phone)?;
    loop {
        match read_status(phone) {
            Ok(status) => print_status(phone, &status, format)?,
            Err(StatusReadError::NotAvailable) => {
                println!("Daemon is not running for {}", phone.name);
            }
            Err(StatusReadError::NotSupported) => {
                return Err(ExitError::runtime(format!(
                    "phone {} does not publish status records",
                    phone.name
                ))
                .into());
            }
            Err(e) => return Err(e.into()),
        }
        if !watch {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        println!();
    }
    Ok(())
}

fn print_status(phone: &PhoneConfig, status: &DaemonStatus, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(status)?);
        }
        OutputFormat::Text => {
            println!("Phone: {} (slot {})", status.phone_id, phone.slot);
            println!("Client: {}", status.client);
            if !status.imei.is_empty() {
                println!("IMEI: {}", status.imei);
            }
            println!("Battery: {}", battery_label(&status.battery));
            println!("Signal: {}", signal_label(&status.signal));
            println!(
                "Received: {}  Sent: {}  Failed: {}",
                status.received, status.sent, status.failed
            );
        }
    }
    Ok(())
}
