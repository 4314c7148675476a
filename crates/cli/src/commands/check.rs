// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Check command handler: validate the configuration and show what the
//! daemon would run.

use anyhow::Result;
use smsd_daemon::SmsdConfig;

use crate::output::OutputFormat;

pub fn handle(cfg: &SmsdConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let phones: Vec<_> = cfg
                .phones
                .iter()
                .map(|phone| {
                    serde_json::json!({
                        "slot": phone.slot,
                        "name": phone.name,
                        "driver": phone.driver,
                        "device": phone.device,
                        "spool": phone.spool_dir,
                        "status": phone.status_path,
                        "poll_interval_ms": phone.poll_interval.as_millis() as u64,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "config": cfg.path,
                    "state_dir": cfg.state_dir,
                    "phones": phones,
                }))?
            );
        }
        OutputFormat::Text => {
            println!("Config {} is valid", cfg.path.display());
            println!("State dir: {}", cfg.state_dir.display());
            for phone in &cfg.phones {
                let status = match &phone.status_path {
                    Some(path) => path.display().to_string(),
                    None => "off".to_string(),
                };
                println!(
                    "  [{}] {}: driver={} device={} status={}",
                    phone.slot, phone.name, phone.driver, phone.device, status
                );
            }
        }
    }
    Ok(())
}
