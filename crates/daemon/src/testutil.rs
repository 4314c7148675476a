// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Shared helpers for the in-crate tests.

use crate::config::PhoneConfig;
use crate::retry::RetryConfig;
use std::path::Path;
use std::time::Duration;

/// A slot rooted at `root` with intervals small enough for tests to run
/// in real time.
pub fn phone_config(root: &Path) -> PhoneConfig {
    PhoneConfig {
        slot: 0,
        name: "test".to_string(),
        phone_id: "test".to_string(),
        client: "smsd test".to_string(),
        device: "mock:0".to_string(),
        driver: "dummy".to_string(),
        run_dir: root.to_path_buf(),
        spool_dir: root.join("spool"),
        status_path: Some(root.join("status")),
        poll_interval: Duration::from_millis(5),
        retry: RetryConfig {
            send_retries: 3,
            send_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(100),
            connect_attempts: 2,
            connect_delay: Duration::from_millis(5),
            never_give_up: false,
        },
        max_payload_chars: 1530,
        disconnect_timeout: Duration::from_millis(200),
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn wait_for(cond: impl Fn() -> bool, what: &str) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}
