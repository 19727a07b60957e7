use std::sync::Arc;

use golds_core::{CounterError, CounterKey, CounterStore};
use tracing::info;

/// Identity-level view over the counter store. Applies the `<identity>_golds`
/// key convention so callers never build keys themselves.
#[derive(Clone)]
pub struct GoldCounters {
    store: Arc<dyn CounterStore>,
}

impl GoldCounters {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn increment(&self, identity: &str) -> Result<i64, CounterError> {
        self.store.increment(&CounterKey::for_identity(identity)).await
    }

    pub async fn read(&self, identity: &str) -> Result<i64, CounterError> {
        self.store.read(&CounterKey::for_identity(identity)).await
    }

    pub async fn reset(&self, identity: &str) -> Result<(), CounterError> {
        self.store.delete(&CounterKey::for_identity(identity)).await?;
        info!(event_name = "golds.counter.reset", identity, "counter reset");
        Ok(())
    }
}
