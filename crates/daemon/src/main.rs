// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! smsdd: the SMS delivery daemon.

use clap::Parser;
use smsd_daemon::{read_config, run_all, run_named, SmsdConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smsdd", version, about = "SMS delivery daemon")]
struct Args {
    /// Config file (default: $SMSD_CONFIG, then /etc/smsd.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single named phone slot instead of all of them
    #[arg(short, long)]
    phone: Option<String>,

    /// Stay up after a fatal device error and keep retrying
    #[arg(long)]
    keep_running: bool,

    /// Log to stderr even when the config names a log file
    #[arg(long)]
    foreground: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let path = args.config.unwrap_or_else(smsd_daemon::env::config_path);

    // The log destination comes from the config, so a broken config can
    // only be reported on stderr.
    let cfg = match read_config(&path, false) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("smsdd: {e}");
            return ExitCode::from(2);
        }
    };

    let _guard = init_logging(&cfg, args.foreground);
    info!(
        config = %path.display(),
        phones = cfg.phones.len(),
        version = env!("CARGO_PKG_VERSION"),
        "smsdd starting"
    );

    let outcome = match &args.phone {
        Some(name) => run_named(&cfg, name, !args.keep_running).await,
        None => run_all(&cfg, !args.keep_running).await,
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "daemon terminated with failure");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cfg: &SmsdConfig, foreground: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match (&cfg.log_path, foreground) {
        (Some(path), false) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file = path
                .file_name()
                .map(|f| f.to_os_string())
                .unwrap_or_else(|| "smsd.log".into());
            let _ = std::fs::create_dir_all(dir);
            let appender = tracing_appender::rolling::never(dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
