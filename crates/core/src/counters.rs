//! Counter contract shared by the chat handlers, the HTTP counter page and the
//! storage backends.
//!
//! A counter is a named non-negative integer owned by an external store. The
//! store is the only source of truth: callers never read-modify-write a value
//! locally, they ask the store to increment it atomically.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CounterError;

/// Namespaces per-identity counters from other uses of the same store.
pub const COUNTER_KEY_SUFFIX: &str = "_golds";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CounterKey(String);

impl CounterKey {
    pub fn for_identity(identity: &str) -> Self {
        Self(format!("{identity}{COUNTER_KEY_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOp {
    Read,
    Increment,
    Reset,
}

impl CounterOp {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Increment => "increment",
            Self::Reset => "reset",
        }
    }
}

/// Single round-trip operations against the remote store. Implementations keep
/// no local state and perform no retries.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically adds one and returns the post-increment value.
    async fn increment(&self, key: &CounterKey) -> Result<i64, CounterError>;

    /// Fails with [`CounterError::NotFound`] when the key was never set.
    async fn read(&self, key: &CounterKey) -> Result<i64, CounterError>;

    /// Succeeds even when the key does not exist.
    async fn delete(&self, key: &CounterKey) -> Result<(), CounterError>;
}
