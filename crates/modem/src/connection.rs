// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Connection manager
//!
//! Owns the only live session for a slot. Establishes sessions with bounded
//! low-level retries, fans a message out across its segments, and marks the
//! handle dead the moment the link drops so nothing ever touches a dead
//! session.

use crate::driver::{DeviceDriver, DeviceSession, RawEvent, SegmentReceipt};
use smsd_core::{BatteryCharge, ConnectionError, DeviceError, OutboundMessage, SignalQuality};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tunables for session establishment and teardown.
#[derive(Debug, Clone)]
pub struct ConnectSettings {
    /// Low-level open attempts per connect call.
    pub attempts: u32,
    /// Pause between open attempts.
    pub retry_delay: Duration,
    /// Cap on a graceful close.
    pub disconnect_timeout: Duration,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::from_secs(10),
            disconnect_timeout: Duration::from_secs(5),
        }
    }
}

/// A live device session plus the identity read at connect time.
pub struct ConnectionHandle {
    session: Box<dyn DeviceSession>,
    imei: String,
    alive: bool,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("imei", &self.imei)
            .field("alive", &self.alive)
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    pub fn imei(&self) -> &str {
        &self.imei
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Acknowledgements for every segment of one delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Device references in segment order.
    pub references: Vec<u8>,
}

pub struct ConnectionManager<D> {
    driver: D,
    locator: String,
    settings: ConnectSettings,
}

impl<D: DeviceDriver> ConnectionManager<D> {
    pub fn new(driver: D, locator: impl Into<String>, settings: ConnectSettings) -> Self {
        Self {
            driver,
            locator: locator.into(),
            settings,
        }
    }

    /// Establish a session, making up to `settings.attempts` low-level
    /// attempts with `settings.retry_delay` between them. Surfaces the last
    /// error once the bound is exhausted or the cancel token fires.
    pub async fn connect(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ConnectionHandle, ConnectionError> {
        let attempts = self.settings.attempts.max(1);
        let mut last = ConnectionError::Unreachable;
        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(last);
            }
            match self.try_open().await {
                Ok(handle) => {
                    debug!(imei = %handle.imei, attempt, "device session established");
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "device open failed");
                    last = e;
                }
            }
            if attempt < attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(last),
                    _ = tokio::time::sleep(self.settings.retry_delay) => {}
                }
            }
        }
        Err(last)
    }

    async fn try_open(&self) -> Result<ConnectionHandle, ConnectionError> {
        let mut session = self.driver.open(&self.locator).await?;
        match session.identity().await {
            Ok(imei) => Ok(ConnectionHandle {
                session,
                imei,
                alive: true,
            }),
            Err(e) => {
                warn!(error = %e, "identity read failed on fresh session");
                let _ = session.close().await;
                Err(match e {
                    DeviceError::Timeout | DeviceError::LinkLost => ConnectionError::Unreachable,
                    _ => ConnectionError::Rejected,
                })
            }
        }
    }

    /// Deliver every segment of `msg`, failing fast on the first error.
    /// The message counts as sent only when every segment was acknowledged.
    pub async fn send(
        &self,
        handle: &mut ConnectionHandle,
        msg: &OutboundMessage,
    ) -> Result<DeliveryResult, DeviceError> {
        if !handle.alive {
            return Err(DeviceError::LinkLost);
        }
        let segments = handle.session.segment(msg);
        let mut references = Vec::with_capacity(segments.len());
        for segment in &segments {
            match handle.session.send_segment(&msg.destination, segment).await {
                Ok(SegmentReceipt { reference }) => references.push(reference),
                Err(e) => {
                    if e == DeviceError::LinkLost {
                        handle.alive = false;
                    }
                    return Err(e);
                }
            }
        }
        Ok(DeliveryResult { references })
    }

    /// Drain queued device activity, up to `budget` events.
    pub async fn poll_incoming(
        &self,
        handle: &mut ConnectionHandle,
        budget: usize,
    ) -> Result<Vec<RawEvent>, DeviceError> {
        if !handle.alive {
            return Err(DeviceError::LinkLost);
        }
        match handle.session.poll_events(budget).await {
            Ok(events) => Ok(events),
            Err(e) => {
                if e == DeviceError::LinkLost {
                    handle.alive = false;
                }
                Err(e)
            }
        }
    }

    /// Battery and signal readings. Sampling failures degrade to unknown
    /// values rather than failing the loop iteration.
    pub async fn sample_readings(
        &self,
        handle: &mut ConnectionHandle,
    ) -> (BatteryCharge, SignalQuality) {
        if !handle.alive {
            return (BatteryCharge::unknown(), SignalQuality::unknown());
        }
        let battery = match handle.session.sample_battery().await {
            Ok(battery) => battery,
            Err(DeviceError::LinkLost) => {
                handle.alive = false;
                return (BatteryCharge::unknown(), SignalQuality::unknown());
            }
            Err(e) => {
                debug!(error = %e, "battery sample failed");
                BatteryCharge::unknown()
            }
        };
        let signal = match handle.session.sample_signal().await {
            Ok(signal) => signal,
            Err(DeviceError::LinkLost) => {
                handle.alive = false;
                SignalQuality::unknown()
            }
            Err(e) => {
                debug!(error = %e, "signal sample failed");
                SignalQuality::unknown()
            }
        };
        (battery, signal)
    }

    /// Graceful close, bounded by `settings.disconnect_timeout`. A dead
    /// handle has nothing to close.
    pub async fn disconnect(&self, mut handle: ConnectionHandle) {
        if !handle.alive {
            return;
        }
        match timeout(self.settings.disconnect_timeout, handle.session.close()).await {
            Ok(Ok(())) => debug!("device session closed"),
            Ok(Err(e)) => warn!(error = %e, "device close failed"),
            Err(_) => warn!("device close timed out"),
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
