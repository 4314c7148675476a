// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Outbound delivery specs
//!
//! Messages injected through one backend handle get delivered by a
//! slot holding another, and a subscriber on the event channel sees
//! each send confirmed.

use crate::prelude::*;

#[tokio::test]
async fn a_queued_message_is_delivered_and_archived() {
    let deploy = Deployment::single_phone();
    let queued = inject(
        deploy.phone(),
        NewOutbound::new("+15550001111", "hello from outside"),
    )
    .unwrap();

    let slot = deploy.start();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || deploy.spool_count("sent") == 1).await,
        "message should reach the sent archive"
    );
    slot.stop().await.unwrap();

    assert_eq!(deploy.spool_count("outbox"), 0);
    let archived = deploy.archived("sent");
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, queued.id);
    assert_eq!(archived[0].destination, "+15550001111");
    assert_eq!(archived[0].status, OutboundStatus::Sent);
    // No failures on record for a clean first try.
    assert_eq!(archived[0].attempts, 0);
}

#[tokio::test]
async fn injection_lands_while_the_daemon_runs() {
    let deploy = Deployment::single_phone();
    let slot = deploy.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || pid_path(deploy.phone()).exists()).await);

    inject(
        deploy.phone(),
        NewOutbound::new("+15550002222", "late arrival"),
    )
    .unwrap();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || deploy.spool_count("sent") == 1).await,
        "running slot should pick up the new message"
    );
    slot.stop().await.unwrap();
}

#[tokio::test]
async fn subscribers_see_sends_in_priority_order() {
    let deploy = Deployment::single_phone();
    let routine = inject(
        deploy.phone(),
        NewOutbound::new("+15550003333", "routine update"),
    )
    .unwrap();
    let urgent = inject(
        deploy.phone(),
        NewOutbound::new("+15550004444", "urgent alert").with_priority(9),
    )
    .unwrap();

    let (tx, mut rx) = event_channel();
    let slot = deploy.start_with(RunOptions {
        exit_on_failure: true,
        events: Some(tx),
        flag: None,
    });

    let mut delivered = Vec::new();
    while delivered.len() < 2 {
        let event = tokio::time::timeout(Duration::from_millis(SPEC_WAIT_MAX_MS), rx.recv())
            .await
            .expect("send confirmations should arrive")
            .expect("event channel should stay open while the slot runs");
        if let DaemonEvent::SendStatus { id, outcome, .. } = event {
            assert_eq!(outcome, SendOutcome::Sent);
            delivered.push(id);
        }
    }
    slot.stop().await.unwrap();

    assert_eq!(delivered, vec![urgent.id, routine.id]);
}

#[tokio::test]
async fn concurrent_injections_are_neither_lost_nor_duplicated() {
    let deploy = Deployment::single_phone();
    let slot = deploy.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || pid_path(deploy.phone()).exists()).await);

    let mut writers = tokio::task::JoinSet::new();
    for writer in 0..8 {
        let phone = deploy.phone().clone();
        writers.spawn_blocking(move || {
            let mut ids = Vec::new();
            for n in 0..4 {
                let queued = inject(
                    &phone,
                    NewOutbound::new("+15550007777", format!("writer {writer} message {n}")),
                )
                .unwrap();
                ids.push(queued.id);
            }
            ids
        });
    }
    let mut injected = Vec::new();
    while let Some(ids) = writers.join_next().await {
        injected.extend(ids.unwrap());
    }
    assert_eq!(injected.len(), 32);

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || deploy.spool_count("sent") == 32).await,
        "every injected message should be delivered exactly once"
    );
    slot.stop().await.unwrap();

    let mut archived: Vec<_> = deploy.archived("sent").into_iter().map(|m| m.id).collect();
    archived.sort();
    injected.sort();
    assert_eq!(archived, injected);
    assert_eq!(deploy.spool_count("outbox"), 0);
    assert_eq!(deploy.spool_count("error"), 0);
}

#[tokio::test]
async fn an_interrupted_send_is_finished_after_restart() {
    let deploy = Deployment::single_phone();
    let backend = deploy.spool();
    let msg = backend
        .insert_outbound(NewOutbound::new("+15550005555", "caught mid-flight"), 0)
        .unwrap();
    // The previous daemon died between the in-flight marker and the
    // device accepting the message.
    backend.mark_inflight(&msg.id).unwrap();

    let slot = deploy.start();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || deploy.spool_count("sent") == 1).await,
        "recovered message should be delivered"
    );
    slot.stop().await.unwrap();

    let archived = deploy.archived("sent");
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, msg.id);
}
