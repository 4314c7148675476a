// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! smsctl: control and inspect the SMS delivery daemon.

mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use exit_error::ExitError;
use output::OutputFormat;
use smsd_daemon::read_config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "smsctl", version, about = "Control and inspect the SMS delivery daemon")]
struct Cli {
    /// Config file (default: $SMSD_CONFIG, then /etc/smsd.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Phone name from the config (default: the only configured phone)
    #[arg(short, long, global = true)]
    phone: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Queue a message for delivery
    Inject {
        /// Destination number, e.g. +15551234567
        destination: String,
        /// Message text
        text: String,
        /// Delivery priority; higher drains first
        #[arg(short = 'P', long, default_value_t = 0)]
        priority: u8,
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Show the daemon status record for a phone
    Status {
        /// Refresh once a second until interrupted
        #[arg(short, long)]
        watch: bool,
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Ask a running daemon to shut down
    Stop,
    /// List queued outbound messages
    Queue {
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// List received messages
    Inbox {
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Validate the config file and show the slots it declares
    Check {
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("smsctl: {e:#}");
            let code = e
                .downcast_ref::<ExitError>()
                .map(|exit| exit.code)
                .unwrap_or(1);
            ExitCode::from(code.clamp(0, u8::MAX as i32) as u8)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config.unwrap_or_else(smsd_daemon::env::config_path);
    let cfg = read_config(&path, false).map_err(|e| ExitError::usage(e.to_string()))?;
    let phone = cli.phone.as_deref();

    match cli.command {
        Command::Inject {
            destination,
            text,
            priority,
            output,
        } => commands::inject::handle(&cfg, phone, destination, text, priority, output),
        Command::Status { watch, output } => {
            commands::status::handle(&cfg, phone, output, watch).await
        }
        Command::Stop => commands::stop::handle(&cfg, phone),
        Command::Queue { output } => commands::queue::handle(&cfg, phone, output),
        Command::Inbox { output } => commands::inbox::handle(&cfg, phone, output),
        Command::Check { output } => commands::check::handle(&cfg, output),
    }
}
