// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Slot lifecycle specs
//!
//! Pid files, slot locks, operator stop requests, and multi-slot
//! shutdown.

use crate::prelude::*;

#[tokio::test]
async fn running_slot_writes_a_live_pid_file() {
    let deploy = Deployment::single_phone();
    let slot = deploy.start();

    let pid_file = pid_path(deploy.phone());
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || pid_file.exists()).await,
        "pid file should appear"
    );
    let recorded: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert_eq!(recorded, std::process::id());

    slot.stop().await.unwrap();
    assert!(!pid_file.exists(), "graceful exit should remove the pid file");
}

#[tokio::test]
async fn second_instance_cannot_claim_a_running_slot() {
    let deploy = Deployment::single_phone();
    let slot = deploy.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || pid_path(deploy.phone()).exists()).await);

    match acquire_slot(deploy.phone()) {
        Err(LifecycleError::LockFailed { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second acquire should fail while the slot runs"),
    }

    slot.stop().await.unwrap();
}

#[tokio::test]
async fn stop_request_from_outside_ends_the_slot() {
    let deploy = Deployment::single_phone();
    let slot = deploy.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || pid_path(deploy.phone()).exists()).await);

    request_shutdown(deploy.phone()).unwrap();
    slot.join().await.unwrap();

    assert!(
        !stop_path(deploy.phone()).exists(),
        "stop file should be cleaned up on exit"
    );
    assert!(!pid_path(deploy.phone()).exists());
}

#[tokio::test]
async fn stop_request_without_a_daemon_reports_not_running() {
    let deploy = Deployment::single_phone();
    let err = request_shutdown(deploy.phone()).unwrap_err();
    assert!(matches!(err, ShutdownRequestError::NotRunning));
}

#[tokio::test]
async fn slot_restarts_cleanly_after_a_stop() {
    let deploy = Deployment::single_phone();
    let pid_file = pid_path(deploy.phone());

    let first = deploy.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || pid_file.exists()).await);
    first.stop().await.unwrap();

    let second = deploy.start();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || pid_file.exists()).await,
        "slot should come back up after a clean stop"
    );
    second.stop().await.unwrap();
}

#[tokio::test]
async fn leftover_stop_file_does_not_kill_a_fresh_start() {
    let deploy = Deployment::single_phone();
    std::fs::create_dir_all(&deploy.phone().run_dir).unwrap();
    std::fs::write(stop_path(deploy.phone()), b"stop\n").unwrap();

    let slot = deploy.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || pid_path(deploy.phone()).exists()).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(slot.flag.state(), ShutdownState::Running);

    slot.stop().await.unwrap();
}

#[tokio::test]
async fn every_slot_stops_when_each_is_asked() {
    let deploy = Deployment::with_phones(&["left", "right"]);
    let cfg = deploy.config().clone();
    let task = tokio::spawn(async move { run_all(&cfg, true).await });

    for slot in 0..2 {
        let phone = deploy.phone_at(slot);
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || pid_path(phone).exists()).await,
            "slot {slot} should come up"
        );
    }
    for slot in 0..2 {
        request_shutdown(deploy.phone_at(slot)).unwrap();
    }

    tokio::time::timeout(Duration::from_millis(SPEC_WAIT_MAX_MS), task)
        .await
        .expect("run_all should return once every slot stopped")
        .unwrap()
        .unwrap();
}
