use std::time::Duration;

use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use thiserror::Error;

/// Every fire after the first is exactly one period after the previous one.
/// Daylight-saving changes are not re-anchored to the wall-clock time.
pub const FIRE_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid daily fire time {hour:02}:{minute:02}:{second:02}")]
    InvalidTime { hour: u32, minute: u32, second: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self, ScheduleError> {
        NaiveTime::from_hms_opt(hour, minute, second)
            .map(|time| Self { time })
            .ok_or(ScheduleError::InvalidTime { hour, minute, second })
    }

    /// Today's fire instant, or tomorrow's if today's has already passed.
    pub fn first_fire<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let today = resolve_local(&now.timezone(), now.date_naive().and_time(self.time));
        if *now > today {
            today + chrono::Duration::hours(24)
        } else {
            today
        }
    }

    pub fn initial_delay<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        self.first_fire(now).signed_duration_since(now.clone()).to_std().unwrap_or(Duration::ZERO)
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Skipped by a forward clock change; land just after the gap.
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}
