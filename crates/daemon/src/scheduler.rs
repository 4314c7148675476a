// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Delivery loop.
//!
//! One scheduler drives one phone slot through a connection state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected <-> {Draining, Idle}
//!       ^                           |
//!       '------- Disconnecting <----'          ...-> Terminated
//! ```
//!
//! Every connected iteration follows the same order: shutdown check,
//! drain device events, sample readings, take at most one due outbound
//! message, publish a status snapshot. The loop idles only when an
//! iteration found nothing to do, so a burst of traffic drains at full
//! speed before the poll interval matters again.

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

use crate::config::PhoneConfig;
use crate::retry::{decide, Decision, FailureKind};
use crate::shutdown::ShutdownFlag;
use crate::status::StatusPublisher;
use smsd_backend::{BackendError, QueueBackend};
use smsd_core::{
    BatteryCharge, Clock, ConnectionError, DaemonEvent, DaemonStatus, DeviceError, MessageId,
    OutboundMessage, SendOutcome, SignalQuality, EVENT_QUEUE_DEPTH,
};
use smsd_modem::{ConnectSettings, ConnectionHandle, ConnectionManager, DeviceDriver, RawEvent};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Most device events routed in one connected iteration.
const POLL_BUDGET: usize = 16;

/// Device references are one byte, so this many sends can be correlated
/// with late delivery reports before references recycle.
const REFERENCE_SLOTS: usize = 256;

/// Reasons a delivery loop gives up.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("message store failed: {0}")]
    Backend(#[from] BackendError),
    #[error("device connection failed: {0}")]
    Connect(ConnectionError),
}

/// Where the loop is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Disconnected,
    Connecting,
    Connected,
    Draining,
    Idle,
    Disconnecting,
    Terminated,
}

/// Bounded channel for daemon events, sized to the default depth.
pub fn event_channel() -> (mpsc::Sender<DaemonEvent>, mpsc::Receiver<DaemonEvent>) {
    mpsc::channel(EVENT_QUEUE_DEPTH)
}

pub struct Scheduler<D: DeviceDriver, C: Clock> {
    phone: PhoneConfig,
    backend: Arc<dyn QueueBackend>,
    manager: ConnectionManager<D>,
    clock: C,
    flag: ShutdownFlag,
    publisher: StatusPublisher,
    events: Option<mpsc::Sender<DaemonEvent>>,
    exit_on_failure: bool,

    state: LoopState,
    handle: Option<ConnectionHandle>,
    current: Option<OutboundMessage>,
    imei: String,
    battery: BatteryCharge,
    signal: SignalQuality,
    received: u32,
    sent: u32,
    failed: u32,
    connect_cycles: u32,
    pause_before_reconnect: bool,
    last_fatal: Option<FatalError>,
    recent_refs: Vec<Option<MessageId>>,
}

impl<D: DeviceDriver, C: Clock> Scheduler<D, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        phone: PhoneConfig,
        backend: Arc<dyn QueueBackend>,
        driver: D,
        clock: C,
        flag: ShutdownFlag,
        publisher: StatusPublisher,
        events: Option<mpsc::Sender<DaemonEvent>>,
        exit_on_failure: bool,
    ) -> Self {
        let manager = ConnectionManager::new(
            driver,
            phone.device.clone(),
            ConnectSettings {
                attempts: phone.retry.connect_attempts,
                retry_delay: phone.retry.connect_delay,
                disconnect_timeout: phone.disconnect_timeout,
            },
        );
        Self {
            phone,
            backend,
            manager,
            clock,
            flag,
            publisher,
            events,
            exit_on_failure,
            state: LoopState::Disconnected,
            handle: None,
            current: None,
            imei: String::new(),
            battery: BatteryCharge::unknown(),
            signal: SignalQuality::unknown(),
            received: 0,
            sent: 0,
            failed: 0,
            connect_cycles: 0,
            pause_before_reconnect: false,
            last_fatal: None,
            recent_refs: vec![None; REFERENCE_SLOTS],
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Drive the loop until termination. `Ok` after a clean shutdown; the
    /// fatal error that stopped the slot otherwise.
    pub async fn run(mut self) -> Result<(), FatalError> {
        let recovered = self.backend.recover()?;
        if recovered > 0 {
            info!(
                phone = %self.phone.name,
                count = recovered,
                "recovered interrupted sends"
            );
        }

        loop {
            match self.state {
                LoopState::Disconnected => self.step_disconnected().await,
                LoopState::Connecting => self.step_connecting().await,
                LoopState::Connected => self.step_connected().await,
                LoopState::Draining => self.step_draining().await,
                LoopState::Idle => self.step_idle().await,
                LoopState::Disconnecting => self.step_disconnecting().await,
                LoopState::Terminated => break,
            }
        }

        self.publish();
        self.flag.mark_terminated();
        info!(
            phone = %self.phone.name,
            sent = self.sent,
            received = self.received,
            failed = self.failed,
            "delivery loop terminated"
        );
        match self.last_fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Record a failure the policy classified fatal. With exit_on_failure
    /// the slot shuts down carrying the error; otherwise the device cycle
    /// restarts after a pause.
    fn on_fatal(&mut self, err: FatalError) {
        if self.exit_on_failure {
            warn!(phone = %self.phone.name, error = %err, "fatal error, shutting down");
            self.last_fatal = Some(err);
            self.flag.request();
        } else {
            warn!(phone = %self.phone.name, error = %err, "fatal error, will reconnect");
            self.pause_before_reconnect = true;
        }
        self.state = LoopState::Disconnecting;
    }

    async fn step_disconnected(&mut self) {
        if self.flag.is_requested() {
            self.state = LoopState::Terminated;
            return;
        }
        if std::mem::take(&mut self.pause_before_reconnect) {
            self.idle_wait(self.phone.retry.connect_delay).await;
            // The pause may have been cut short by a shutdown request;
            // the next Disconnected pass picks that up.
            return;
        }
        self.state = LoopState::Connecting;
    }

    async fn step_connecting(&mut self) {
        if self.flag.is_requested() {
            self.state = LoopState::Disconnected;
            return;
        }
        self.publish();
        match self.manager.connect(self.flag.token()).await {
            Ok(handle) => {
                self.imei = handle.imei().to_string();
                self.handle = Some(handle);
                self.connect_cycles = 0;
                info!(phone = %self.phone.name, imei = %self.imei, "connected to device");
                self.state = LoopState::Connected;
            }
            Err(e) if self.flag.is_requested() => {
                debug!(phone = %self.phone.name, error = %e, "connect abandoned by shutdown");
                self.state = LoopState::Disconnected;
            }
            Err(e) => {
                self.connect_cycles += 1;
                match decide(FailureKind::Connect(e), self.connect_cycles, &self.phone.retry) {
                    Decision::Retry(delay) => {
                        debug!(
                            phone = %self.phone.name,
                            error = %e,
                            cycle = self.connect_cycles,
                            "connect cycle failed, retrying"
                        );
                        self.idle_wait(delay).await;
                    }
                    Decision::Abandon | Decision::Fatal => {
                        self.on_fatal(FatalError::Connect(e));
                    }
                }
            }
        }
    }

    async fn step_connected(&mut self) {
        if self.flag.is_requested() {
            self.state = LoopState::Disconnecting;
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            self.state = LoopState::Disconnected;
            return;
        };

        let polled = self.manager.poll_incoming(handle, POLL_BUDGET).await;
        let had_events = match polled {
            Ok(events) => {
                let count = events.len();
                for event in events {
                    if let Err(e) = self.route_event(event) {
                        self.on_fatal(FatalError::Backend(e));
                        return;
                    }
                }
                count > 0
            }
            Err(DeviceError::LinkLost) => {
                warn!(phone = %self.phone.name, "device link lost, reconnecting");
                self.handle = None;
                self.state = LoopState::Disconnected;
                return;
            }
            Err(e) => {
                debug!(phone = %self.phone.name, error = %e, "event poll failed");
                false
            }
        };

        let mut lost = false;
        if let Some(handle) = self.handle.as_mut() {
            let (battery, signal) = self.manager.sample_readings(handle).await;
            self.battery = battery;
            self.signal = signal;
            lost = !handle.is_alive();
        }
        if lost {
            warn!(phone = %self.phone.name, "device link lost, reconnecting");
            self.handle = None;
            self.state = LoopState::Disconnected;
            return;
        }

        match self.backend.next_pending(self.clock.epoch_ms()) {
            Ok(Some(msg)) => {
                self.current = Some(msg);
                self.state = LoopState::Draining;
            }
            Ok(None) if had_events => {
                // Something happened; go around once more before idling.
                self.publish();
            }
            Ok(None) => self.state = LoopState::Idle,
            Err(e) => self.on_fatal(FatalError::Backend(e)),
        }
    }

    async fn step_draining(&mut self) {
        let Some(msg) = self.current.take() else {
            self.state = LoopState::Connected;
            return;
        };
        if self.handle.is_none() {
            // The message stays pending; a fresh session will retake it.
            self.state = LoopState::Disconnected;
            return;
        }
        if let Err(e) = self.backend.mark_inflight(&msg.id) {
            self.on_fatal(FatalError::Backend(e));
            return;
        }

        let result = match self.handle.as_mut() {
            Some(handle) => self.manager.send(handle, &msg).await,
            None => Err(DeviceError::LinkLost),
        };

        match result {
            Ok(delivery) => {
                if let Err(e) = self.backend.mark_sent(&msg.id) {
                    self.on_fatal(FatalError::Backend(e));
                    return;
                }
                self.sent = self.sent.saturating_add(1);
                for reference in delivery.references {
                    self.recent_refs[usize::from(reference)] = Some(msg.id.clone());
                }
                info!(
                    phone = %self.phone.name,
                    id = %msg.id,
                    destination = %msg.destination,
                    attempts = msg.attempts,
                    "message sent"
                );
                self.forward(DaemonEvent::SendStatus {
                    id: msg.id.clone(),
                    outcome: SendOutcome::Sent,
                    error: None,
                });
                self.state = LoopState::Connected;
            }
            Err(e) => {
                let attempts = msg.attempts.saturating_add(1);
                let link_lost = e == DeviceError::LinkLost;
                match decide(FailureKind::Send(e), attempts, &self.phone.retry) {
                    Decision::Retry(delay) => {
                        let gate = self
                            .clock
                            .epoch_ms()
                            .saturating_add(delay.as_millis() as u64);
                        if let Err(be) =
                            self.backend.defer(&msg.id, attempts, gate, &e.to_string())
                        {
                            self.on_fatal(FatalError::Backend(be));
                            return;
                        }
                        debug!(
                            phone = %self.phone.name,
                            id = %msg.id,
                            attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "send failed, will retry"
                        );
                    }
                    Decision::Abandon | Decision::Fatal => {
                        if let Err(be) = self.backend.mark_failed(&msg.id, &e.to_string()) {
                            self.on_fatal(FatalError::Backend(be));
                            return;
                        }
                        self.failed = self.failed.saturating_add(1);
                        warn!(
                            phone = %self.phone.name,
                            id = %msg.id,
                            attempts,
                            error = %e,
                            "message abandoned"
                        );
                        self.forward(DaemonEvent::SendStatus {
                            id: msg.id.clone(),
                            outcome: SendOutcome::Failed,
                            error: Some(e.to_string()),
                        });
                    }
                }
                if link_lost {
                    self.handle = None;
                    self.state = LoopState::Disconnected;
                } else {
                    self.state = LoopState::Connected;
                }
            }
        }
        self.publish();
    }

    async fn step_idle(&mut self) {
        self.publish();
        self.idle_wait(self.phone.poll_interval).await;
        self.state = LoopState::Connected;
    }

    async fn step_disconnecting(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.manager.disconnect(handle).await;
        }
        self.publish();
        self.state = LoopState::Disconnected;
    }

    /// Route one device event. Backend failures bubble up; everything
    /// else is forwarded or dropped here.
    fn route_event(&mut self, event: RawEvent) -> Result<(), BackendError> {
        match event {
            RawEvent::Message(part) => match self.backend.append_inbound(part)? {
                Some(msg) => {
                    self.received = self.received.saturating_add(1);
                    info!(
                        phone = %self.phone.name,
                        id = %msg.id,
                        sender = %msg.sender,
                        parts = msg.parts,
                        "message received"
                    );
                    self.forward(DaemonEvent::IncomingMessage {
                        id: msg.id,
                        sender: msg.sender,
                        body: msg.body,
                        received_at: msg.received_at,
                    });
                }
                None => {
                    debug!(phone = %self.phone.name, "fragment filed, awaiting the rest");
                }
            },
            RawEvent::StatusReport {
                reference,
                delivered,
            } => {
                if let Some(id) = self.recent_refs[usize::from(reference)].clone() {
                    debug!(
                        phone = %self.phone.name,
                        id = %id,
                        reference,
                        delivered,
                        "delivery report"
                    );
                    if delivered {
                        self.forward(DaemonEvent::SendStatus {
                            id,
                            outcome: SendOutcome::Delivered,
                            error: None,
                        });
                    }
                } else {
                    debug!(
                        phone = %self.phone.name,
                        reference,
                        "delivery report for an unknown reference"
                    );
                }
            }
            RawEvent::Call { number } => {
                info!(phone = %self.phone.name, number = %number, "incoming call");
                self.forward(DaemonEvent::IncomingCall { number });
            }
            RawEvent::Broadcast { channel, body } => {
                self.forward(DaemonEvent::IncomingBroadcast { channel, body });
            }
            RawEvent::Ussd { body } => {
                self.forward(DaemonEvent::IncomingUssd { body });
            }
        }
        Ok(())
    }

    /// Hand an event to the subscriber without ever blocking the loop. A
    /// full queue drops the event; a hung-up subscriber disables
    /// forwarding for good.
    fn forward(&mut self, event: DaemonEvent) {
        let Some(tx) = &self.events else { return };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(phone = %self.phone.name, ?event, "event queue full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(phone = %self.phone.name, "event subscriber gone, forwarding disabled");
                self.events = None;
            }
        }
    }

    async fn idle_wait(&self, duration: Duration) {
        tokio::select! {
            _ = self.flag.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    fn publish(&self) {
        let mut status = DaemonStatus::new(self.phone.phone_id.clone(), self.phone.client.clone());
        status.battery = self.battery;
        status.signal = self.signal;
        status.received = self.received;
        status.sent = self.sent;
        status.failed = self.failed;
        status.imei = self.imei.clone();
        self.publisher.publish(&status);
    }
}
