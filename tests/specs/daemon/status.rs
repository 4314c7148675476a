// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Status record specs
//!
//! The on-disk record is the only channel a separate process has into
//! a running slot. It must appear promptly, reflect the device, and
//! survive the daemon's exit.

use crate::prelude::*;
use smsd_daemon::{read_status, StatusReadError};
use smsd_modem::DUMMY_IMEI;

#[tokio::test]
async fn a_running_slot_publishes_a_readable_record() {
    let deploy = Deployment::single_phone();
    let slot = deploy.start();

    let path = deploy.phone().status_path.clone().unwrap();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || path.exists()).await,
        "status record should appear"
    );
    let status = read_status_file(&path).unwrap();
    assert_eq!(status.phone_id, deploy.phone().phone_id);
    assert_eq!(status.client, deploy.phone().client);

    slot.stop().await.unwrap();
}

#[tokio::test]
async fn the_record_reflects_device_identity_and_counters() {
    let deploy = Deployment::single_phone();
    inject(deploy.phone(), NewOutbound::new("+15550006666", "count me")).unwrap();

    let slot = deploy.start();
    let path = deploy.phone().status_path.clone().unwrap();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            read_status_file(&path).is_ok_and(|s| s.sent == 1)
        })
        .await,
        "record should count the send"
    );

    let status = read_status_file(&path).unwrap();
    assert_eq!(status.imei, DUMMY_IMEI);
    assert_eq!(status.battery.percent, 100);
    assert_eq!(status.signal.dbm, -53);
    assert_eq!(status.failed, 0);

    slot.stop().await.unwrap();
}

#[tokio::test]
async fn counters_never_move_backwards() {
    let deploy = Deployment::single_phone();
    for n in 0..3 {
        inject(
            deploy.phone(),
            NewOutbound::new("+15550008888", format!("burst {n}")),
        )
        .unwrap();
    }

    let slot = deploy.start();
    let path = deploy.phone().status_path.clone().unwrap();
    let mut last = 0;
    let done = wait_for(SPEC_WAIT_MAX_MS, || {
        let Ok(status) = read_status_file(&path) else {
            return false;
        };
        assert!(status.sent >= last, "sent counter went backwards");
        last = status.sent;
        last == 3
    })
    .await;
    assert!(done, "all three sends should be counted");
    slot.stop().await.unwrap();
}

#[tokio::test]
async fn the_final_flush_outlives_the_daemon() {
    let deploy = Deployment::single_phone();
    let slot = deploy.start();
    let path = deploy.phone().status_path.clone().unwrap();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || path.exists()).await);
    slot.stop().await.unwrap();

    let status = read_status_file(&path).unwrap();
    assert_eq!(status.phone_id, deploy.phone().phone_id);
}

#[test]
fn a_phone_that_never_ran_has_no_record() {
    let deploy = Deployment::single_phone();
    let err = read_status(deploy.phone()).unwrap_err();
    assert!(matches!(err, StatusReadError::NotAvailable));
}
