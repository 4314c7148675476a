// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

use super::*;
use smsd_daemon::RetryConfig;
use std::path::PathBuf;
use std::time::Duration;

fn config_with(names: &[&str]) -> SmsdConfig {
    let phones = names
        .iter()
        .enumerate()
        .map(|(slot, name)| PhoneConfig {
            slot,
            name: name.to_string(),
            phone_id: name.to_string(),
            client: "smsd test".to_string(),
            device: "dummy:0".to_string(),
            driver: "dummy".to_string(),
            run_dir: PathBuf::from("/tmp/smsd").join(name),
            spool_dir: PathBuf::from("/tmp/smsd").join(name).join("spool"),
            status_path: None,
            poll_interval: Duration::from_secs(1),
            retry: RetryConfig::default(),
            max_payload_chars: 1530,
            disconnect_timeout: Duration::from_secs(5),
        })
        .collect();
    SmsdConfig {
        path: PathBuf::from("/tmp/smsd/smsd.toml"),
        state_dir: PathBuf::from("/tmp/smsd"),
        log_path: None,
        phones,
    }
}

#[test]
fn sole_phone_is_selected_without_a_name() {
    let cfg = config_with(&["primary"]);
    assert_eq!(select_phone(&cfg, None).unwrap().name, "primary");
}

#[test]
fn explicit_name_wins_over_ambiguity() {
    let cfg = config_with(&["alpha", "beta"]);
    assert_eq!(select_phone(&cfg, Some("beta")).unwrap().slot, 1);
}

#[test]
fn ambiguous_selection_is_a_usage_error() {
    let cfg = config_with(&["alpha", "beta"]);
    let err = select_phone(&cfg, None).unwrap_err();
    let exit = err.downcast_ref::<ExitError>().expect("exit error");
    assert_eq!(exit.code, 2);
}

#[test]
fn unknown_name_surfaces_the_config_error() {
    let cfg = config_with(&["alpha"]);
    assert!(select_phone(&cfg, Some("missing")).is_err());
}
