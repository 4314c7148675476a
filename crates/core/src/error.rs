// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Shared failure vocabulary for device operations

use thiserror::Error;

/// A failed device operation on an established session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The device did not answer within the operation deadline.
    #[error("device operation timed out")]
    Timeout,

    /// The device cannot accept more messages right now.
    #[error("device storage is full")]
    DeviceFull,

    /// The device refused the message outright.
    #[error("device rejected the message")]
    DeviceRejected,

    /// The session died mid-operation; the handle is no longer usable.
    #[error("link to the device was lost")]
    LinkLost,
}

/// A failed attempt to establish a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("device is unreachable")]
    Unreachable,

    #[error("device is busy or held by another client")]
    Busy,

    #[error("device refused the session")]
    Rejected,
}
