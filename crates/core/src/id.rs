// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the smsd authors

//! Message identifiers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier assigned when a message enters a spool.
///
/// Generated ids are filesystem-safe (`msg-` plus a hex uuid), so a spool
/// backend can use them directly as file stems.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh unique id.
    pub fn generate() -> Self {
        Self(format!("msg-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
