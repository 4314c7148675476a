// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Error type that carries a process exit code.
//!
//! Commands return an `ExitError` instead of calling
//! `std::process::exit()` directly; `main()` turns it into the final
//! exit status after printing the message once.
//!
//! smsctl uses 1 for runtime failures (daemon not running, spool
//! trouble) and 2 for usage errors (bad config, invalid message).

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Runtime failure: the request was fine, the world was not.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(1, message)
    }

    /// Usage failure: the operator asked for something invalid.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}
