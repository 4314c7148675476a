// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Config file specs
//!
//! A file on disk drives a real slot end to end, and `SMSD_CONFIG`
//! steers which file the binaries pick up. Everything here is serial:
//! config loading consults the environment.

use crate::prelude::*;
use serial_test::serial;
use std::path::PathBuf;

fn write_file(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
#[serial]
async fn a_config_file_drives_a_slot_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state");
    let path = write_file(
        dir.path(),
        "smsd.toml",
        &format!(
            r#"
[smsd]
state_dir = "{}"

[phone.primary]
device = "dummy:0"
phone_id = "PRIMARY-1"
poll_interval_ms = 5
"#,
            state.display()
        ),
    );

    let cfg = SmsdConfig::load(&path).unwrap();
    let phone = cfg.phone_named("primary").unwrap().clone();
    assert_eq!(phone.phone_id, "PRIMARY-1");
    assert_eq!(phone.spool_dir, state.join("primary").join("spool"));

    inject(&phone, NewOutbound::new("+15551230000", "from a file")).unwrap();

    let flag = ShutdownFlag::new();
    let task = {
        let cfg = cfg.clone();
        let flag = flag.clone();
        tokio::spawn(async move {
            run_slot(
                &cfg,
                0,
                RunOptions {
                    exit_on_failure: true,
                    events: None,
                    flag: Some(flag),
                },
            )
            .await
        })
    };

    let sent = phone.spool_dir.join("sent");
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || file_count(&sent) == 1).await,
        "configured slot should deliver the queued message"
    );

    flag.request();
    tokio::time::timeout(Duration::from_millis(SPEC_WAIT_MAX_MS), task)
        .await
        .expect("slot should stop in time")
        .unwrap()
        .unwrap();

    let status = read_status_file(&phone.status_path.unwrap()).unwrap();
    assert_eq!(status.phone_id, "PRIMARY-1");
    assert_eq!(status.sent, 1);
}

#[test]
#[serial]
fn the_config_env_var_picks_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("elsewhere.toml");

    std::env::set_var("SMSD_CONFIG", &path);
    let picked = smsd_daemon::env::config_path();
    std::env::remove_var("SMSD_CONFIG");

    assert_eq!(picked, path);
    assert_eq!(
        smsd_daemon::env::config_path(),
        PathBuf::from("/etc/smsd.toml")
    );
}

#[test]
#[serial]
fn slots_follow_file_order_across_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        r#"
[smsd]
state_dir = "{}"

[phone.beta]
device = "dummy:1"

[phone.alpha]
device = "dummy:0"
"#,
        dir.path().display()
    );
    let path = write_file(dir.path(), "smsd.toml", &body);

    for _ in 0..3 {
        let cfg = SmsdConfig::load(&path).unwrap();
        assert_eq!(cfg.phones[0].name, "beta");
        assert_eq!(cfg.phones[1].name, "alpha");
    }
}
