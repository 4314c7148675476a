// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Queue command handler: inspect the outbox.

use anyhow::Result;
use smsd_backend::{QueueBackend, SpoolBackend};
use smsd_daemon::SmsdConfig;

use crate::output::{clip, format_epoch_ms, status_label, OutputFormat};

pub fn handle(cfg: &SmsdConfig, phone: Option<&str>, format: OutputFormat) -> Result<()> {
    let phone = super::select_phone(cfg, phone)?;
    let backend = SpoolBackend::open(&phone.spool_dir)?;
    let outbox = backend.outbox()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outbox)?);
        }
        OutputFormat::Text => {
            if outbox.is_empty() {
                println!("Outbox is empty");
                return Ok(());
            }
            println!(
                "{:<37} {:<9} {:>4} {:>8} {:<20} {:<16} {}",
                "ID", "STATUS", "PRIO", "ATTEMPTS", "NEXT TRY", "DESTINATION", "TEXT"
            );
            for msg in &outbox {
                println!(
                    "{:<37} {:<9} {:>4} {:>8} {:<20} {:<16} {}",
                    msg.id,
                    status_label(msg.status),
                    msg.priority,
                    msg.attempts,
                    format_epoch_ms(msg.not_before_ms),
                    clip(&msg.destination, 16),
                    clip(&msg.text, 32),
                );
            }
            println!("\n{} message(s) queued", outbox.len());
        }
    }
    Ok(())
}
