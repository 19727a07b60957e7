use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use golds_core::{DailySchedule, FIRE_PERIOD};
use golds_wecom::HandlerRegistry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self) -> anyhow::Result<()>;
}

/// Nightly review hook. Publishing is not wired to any channel yet, so a run
/// only records what would be reviewed.
pub struct ReviewPublishing {
    registry: Arc<HandlerRegistry>,
}

impl ReviewPublishing {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ScheduledJob for ReviewPublishing {
    fn name(&self) -> &'static str {
        "review_publishing"
    }

    async fn run(&self) -> anyhow::Result<()> {
        info!(
            event_name = "scheduler.review.published",
            correlation_id = "scheduler",
            handlers = self.registry.len(),
            "daily review ran"
        );
        Ok(())
    }
}

pub struct DailyScheduler {
    schedule: DailySchedule,
    job: Arc<dyn ScheduledJob>,
}

impl DailyScheduler {
    pub fn new(schedule: DailySchedule, job: Arc<dyn ScheduledJob>) -> Self {
        Self { schedule, job }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run_from(Local::now(), shutdown))
    }

    /// Fires at the first daily instant after `now` (or at `now` if equal),
    /// then every `FIRE_PERIOD`, until `shutdown` flips or its sender drops.
    pub async fn run_from<Tz>(self, now: DateTime<Tz>, mut shutdown: watch::Receiver<bool>)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let delay = self.schedule.initial_delay(&now);
        info!(
            event_name = "scheduler.daily.armed",
            correlation_id = "scheduler",
            job = self.job.name(),
            first_fire = %self.schedule.first_fire(&now),
            delay_secs = delay.as_secs(),
            "daily job scheduled"
        );

        let mut ticker = interval_at(Instant::now() + delay, FIRE_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.fire().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            event_name = "scheduler.daily.stopped",
            correlation_id = "shutdown",
            job = self.job.name(),
            "daily scheduler stopped"
        );
    }

    async fn fire(&self) {
        match self.job.run().await {
            Ok(()) => info!(
                event_name = "scheduler.daily.fired",
                correlation_id = "scheduler",
                job = self.job.name(),
                "daily job completed"
            ),
            Err(job_error) => error!(
                event_name = "scheduler.daily.failed",
                correlation_id = "scheduler",
                job = self.job.name(),
                error = %job_error,
                "daily job failed; next run unchanged"
            ),
        }
    }
}
