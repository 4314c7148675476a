// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Inbound delivery specs
//!
//! Device fragments go in, one assembled message comes out, durable
//! and visible to any reader of the spool.

use crate::prelude::*;
use chrono::{TimeZone, Utc};
use smsd_core::{InboundPart, SystemClock};
use smsd_daemon::{Scheduler, StatusPublisher};
use smsd_modem::{MockDriver, RawEvent};
use std::sync::Arc;

fn fragment(sender: &str, body: &str, reference: Option<u16>, seq: u8, total: u8) -> InboundPart {
    InboundPart {
        sender: sender.to_string(),
        body: body.to_string(),
        received_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
        reference,
        seq,
        total,
    }
}

/// Run a scheduler over slot 0 of `deploy` with a scripted device.
fn start_scheduler(deploy: &Deployment, driver: MockDriver) -> RunningLoop {
    let flag = ShutdownFlag::new();
    let scheduler = Scheduler::new(
        deploy.phone().clone(),
        Arc::new(deploy.spool()),
        driver,
        SystemClock,
        flag.clone(),
        StatusPublisher::new(None),
        None,
        true,
    );
    RunningLoop {
        flag,
        task: tokio::spawn(scheduler.run()),
    }
}

struct RunningLoop {
    flag: ShutdownFlag,
    task: tokio::task::JoinHandle<Result<(), smsd_daemon::FatalError>>,
}

impl RunningLoop {
    async fn stop(self) {
        self.flag.request();
        tokio::time::timeout(Duration::from_millis(SPEC_WAIT_MAX_MS), self.task)
            .await
            .expect("loop should stop in time")
            .expect("loop task panicked")
            .expect("loop should exit cleanly");
    }
}

#[tokio::test]
async fn fragments_assemble_into_one_inbox_record() {
    let deploy = Deployment::single_phone();
    let driver = MockDriver::new();
    driver.queue_events(vec![
        RawEvent::Message(fragment("+15553334444", " world", Some(7), 2, 2)),
        RawEvent::Message(fragment("+15553334444", "hello", Some(7), 1, 2)),
    ]);

    let task = start_scheduler(&deploy, driver);
    let reader = deploy.spool();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            reader.inbox().is_ok_and(|inbox| inbox.len() == 1)
        })
        .await,
        "assembled message should land in the inbox"
    );
    task.stop().await;

    let inbox = reader.inbox().unwrap();
    assert_eq!(inbox[0].sender, "+15553334444");
    assert_eq!(inbox[0].body, "hello world");
    assert_eq!(inbox[0].parts, 2);
    assert_eq!(
        inbox[0].received_at,
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    );
}

#[tokio::test]
async fn a_single_part_text_needs_no_reference() {
    let deploy = Deployment::single_phone();
    let driver = MockDriver::new();
    driver.queue_events(vec![RawEvent::Message(fragment(
        "+15559990000",
        "just one",
        None,
        1,
        1,
    ))]);

    let task = start_scheduler(&deploy, driver);
    let reader = deploy.spool();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            reader.inbox().is_ok_and(|inbox| inbox.len() == 1)
        })
        .await,
        "single-part message should land in the inbox"
    );
    task.stop().await;

    let inbox = reader.inbox().unwrap();
    assert_eq!(inbox[0].body, "just one");
    assert_eq!(inbox[0].parts, 1);
}
