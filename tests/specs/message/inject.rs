// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Inject specs
//!
//! The write side the CLI uses: destination and payload validation,
//! and visibility of queued messages to other backend handles.

use crate::prelude::*;

#[test]
fn a_queued_message_is_visible_to_other_readers() {
    let deploy = Deployment::single_phone();
    let queued = inject(
        deploy.phone(),
        NewOutbound::new("  +15557778888  ", "hold the line"),
    )
    .unwrap();
    assert_eq!(queued.destination, "+15557778888");

    let reader = deploy.spool();
    let outbox = reader.outbox().unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].id, queued.id);
    assert_eq!(outbox[0].status, OutboundStatus::Pending);
    assert_eq!(outbox[0].text, "hold the line");
}

#[test]
fn blank_destinations_are_refused() {
    let deploy = Deployment::single_phone();
    let err = inject(deploy.phone(), NewOutbound::new("   ", "hello")).unwrap_err();
    assert!(matches!(err, InjectError::EmptyDestination));
}

#[test]
fn garbage_destinations_are_refused() {
    let deploy = Deployment::single_phone();
    for bad in ["letters", "+", "555-0000", "123456789012345678901"] {
        let err = inject(deploy.phone(), NewOutbound::new(bad, "hello")).unwrap_err();
        assert!(
            matches!(err, InjectError::InvalidDestination(_)),
            "{bad:?} should be refused"
        );
    }
    assert_eq!(deploy.spool_count("outbox"), 0);
}

#[test]
fn oversized_payloads_are_refused() {
    let deploy = Deployment::single_phone();
    let text = "a".repeat(deploy.phone().max_payload_chars + 1);
    let err = inject(deploy.phone(), NewOutbound::new("+15550009999", text)).unwrap_err();
    assert!(matches!(err, InjectError::PayloadTooLarge { .. }));
    assert_eq!(deploy.spool_count("outbox"), 0);
}
