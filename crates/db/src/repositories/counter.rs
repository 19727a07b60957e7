use golds_core::{CounterError, CounterKey, CounterStore};
use tracing::{debug, error};

use super::{parse_counter_value, store_unavailable};
use crate::DbPool;

/// Counters in the `counter_kv` table. Each operation is one statement, so the
/// increment is atomic without any local read-modify-write.
pub struct SqlCounterStore {
    pool: DbPool,
}

impl SqlCounterStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn raw_value(&self, key: &CounterKey) -> Result<Option<String>, CounterError> {
        sqlx::query_scalar::<_, String>("SELECT CAST(value AS TEXT) FROM counter_kv WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_unavailable)
    }
}

#[async_trait::async_trait]
impl CounterStore for SqlCounterStore {
    async fn increment(&self, key: &CounterKey) -> Result<i64, CounterError> {
        // A non-integer or maximal value is left untouched and yields no row.
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO counter_kv (key, value) VALUES (?, 1)
             ON CONFLICT(key) DO UPDATE SET value = value + 1
             WHERE typeof(value) = 'integer' AND value < 9223372036854775807
             RETURNING value",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(value)) => {
                debug!(key = %key, value, "counter incremented");
                Ok(value)
            }
            Ok(None) => {
                let raw = self.raw_value(key).await?.unwrap_or_default();
                error!(key = %key, value = %raw, "counter increment rejected");
                match parse_counter_value(key.as_str(), &raw) {
                    Ok(i64::MAX) => Err(CounterError::Overflow { key: key.to_string() }),
                    _ => Err(CounterError::MalformedValue { key: key.to_string(), value: raw }),
                }
            }
            Err(source) => {
                error!(key = %key, error = %source, "counter increment failed");
                Err(store_unavailable(source))
            }
        }
    }

    async fn read(&self, key: &CounterKey) -> Result<i64, CounterError> {
        let raw = self.raw_value(key).await.map_err(|error| {
            error!(key = %key, error = %error, "counter read failed");
            error
        })?;

        let Some(raw) = raw else {
            debug!(key = %key, "counter has never been set");
            return Err(CounterError::NotFound { key: key.to_string() });
        };

        let value = parse_counter_value(key.as_str(), &raw)?;
        debug!(key = %key, value, "counter read");
        Ok(value)
    }

    async fn delete(&self, key: &CounterKey) -> Result<(), CounterError> {
        let removed = sqlx::query("DELETE FROM counter_kv WHERE key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|source| {
                error!(key = %key, error = %source, "counter delete failed");
                store_unavailable(source)
            })?
            .rows_affected();

        debug!(key = %key, removed, "counter deleted");
        Ok(())
    }
}
