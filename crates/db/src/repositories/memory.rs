use std::collections::HashMap;

use golds_core::{CounterError, CounterKey, CounterStore};
use tokio::sync::RwLock;

use super::parse_counter_value;

/// Process-local store with the same semantics as [`super::SqlCounterStore`].
/// Values are kept as text so malformed entries behave like they do remotely.
#[derive(Default)]
pub struct InMemoryCounterStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_raw(&self, key: &CounterKey, value: impl Into<String>) {
        self.values.write().await.insert(key.as_str().to_owned(), value.into());
    }
}

#[async_trait::async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &CounterKey) -> Result<i64, CounterError> {
        let mut values = self.values.write().await;
        let next = match values.get(key.as_str()) {
            Some(raw) => parse_counter_value(key.as_str(), raw)?
                .checked_add(1)
                .ok_or_else(|| CounterError::Overflow { key: key.to_string() })?,
            None => 1,
        };
        values.insert(key.as_str().to_owned(), next.to_string());
        Ok(next)
    }

    async fn read(&self, key: &CounterKey) -> Result<i64, CounterError> {
        let values = self.values.read().await;
        let raw =
            values.get(key.as_str()).ok_or_else(|| CounterError::NotFound { key: key.to_string() })?;
        parse_counter_value(key.as_str(), raw)
    }

    async fn delete(&self, key: &CounterKey) -> Result<(), CounterError> {
        self.values.write().await.remove(key.as_str());
        Ok(())
    }
}
