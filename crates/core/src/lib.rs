pub mod config;
pub mod counters;
pub mod errors;
pub mod schedule;

pub use counters::{CounterKey, CounterOp, CounterStore, COUNTER_KEY_SUFFIX};
pub use errors::{CounterError, InterfaceError};
pub use schedule::{DailySchedule, ScheduleError, FIRE_PERIOD};
