use golds_core::CounterError;

pub mod counter;
pub mod memory;

pub use counter::SqlCounterStore;
pub use memory::InMemoryCounterStore;

fn store_unavailable(error: sqlx::Error) -> CounterError {
    CounterError::StoreUnavailable(error.to_string())
}

fn parse_counter_value(key: &str, raw: &str) -> Result<i64, CounterError> {
    raw.trim().parse::<i64>().map_err(|_| CounterError::MalformedValue {
        key: key.to_owned(),
        value: raw.to_owned(),
    })
}
