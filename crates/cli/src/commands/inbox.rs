// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Inbox command handler: list received messages.

use anyhow::Result;
use smsd_backend::{QueueBackend, SpoolBackend};
use smsd_daemon::SmsdConfig;

use crate::output::{clip, OutputFormat};

pub fn handle(cfg: &SmsdConfig, phone: Option<&str>, format: OutputFormat) -> Result<()> {
    let phone = super::select_phone(cfg, phone)?;
    let backend = SpoolBackend::open(&phone.spool_dir)?;
    let inbox = backend.inbox()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&inbox)?);
        }
        OutputFormat::Text => {
            if inbox.is_empty() {
                println!("Inbox is empty");
                return Ok(());
            }
            println!(
                "{:<20} {:<16} {:>5} {}",
                "RECEIVED", "SENDER", "PARTS", "BODY"
            );
            for msg in &inbox {
                println!(
                    "{:<20} {:<16} {:>5} {}",
                    msg.received_at.format("%Y-%m-%d %H:%M:%S"),
                    clip(&msg.sender, 16),
                    msg.parts,
                    clip(&msg.body, 48),
                );
            }
            println!("\n{} message(s) in the inbox", inbox.len());
        }
    }
    Ok(())
}
