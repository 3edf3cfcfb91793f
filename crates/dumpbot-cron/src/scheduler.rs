// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven job scheduler.
//!
//! One loop per schedule: sleep until the next occurrence in local time,
//! then hand the job to the task tracker with a fresh bounded context. The
//! loop never waits for a job to finish, so a slow run cannot delay the
//! following fire.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use dumpbot_core::{DumpbotError, OpContext};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// A parsed five-field cron expression.
pub struct CronSchedule {
    expr: String,
    cron: croner::Cron,
}

impl std::fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expr).finish()
    }
}

impl CronSchedule {
    /// Parse `expr`, rejecting anything croner does not accept.
    pub fn parse(expr: &str) -> Result<Self, DumpbotError> {
        let expr = expr.trim();
        let cron = croner::Cron::new(expr)
            .parse()
            .map_err(|e| DumpbotError::Config(format!("invalid cron expression `{expr}`: {e}")))?;
        Ok(Self {
            expr: expr.to_string(),
            cron,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First occurrence strictly after `after`.
    pub fn next_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.cron.find_next_occurrence(after, false).ok()
    }
}

/// Work the scheduler fires.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Run once. Failures are the job's to report.
    async fn execute(&self, ctx: OpContext);
}

/// Fires a [`ScheduledJob`] on a [`CronSchedule`].
pub struct Scheduler {
    schedule: CronSchedule,
    job: Arc<dyn ScheduledJob>,
    run_timeout: Duration,
}

impl Scheduler {
    pub fn new(schedule: CronSchedule, job: Arc<dyn ScheduledJob>, run_timeout: Duration) -> Self {
        Self {
            schedule,
            job,
            run_timeout,
        }
    }

    /// Start the schedule loop on `tracker`.
    pub fn spawn(self, shutdown: CancellationToken, tracker: TaskTracker) -> JoinHandle<()> {
        let loop_tracker = tracker.clone();
        tracker.spawn(self.run(shutdown, loop_tracker))
    }

    /// Run the schedule loop until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken, tracker: TaskTracker) {
        info!(
            job = self.job.name(),
            cron = self.schedule.expr(),
            run_timeout_secs = self.run_timeout.as_secs(),
            "scheduler started"
        );

        let mut last_fire: Option<DateTime<Local>> = None;
        loop {
            let now = Local::now();
            // The wall clock can lag the monotonic sleep; never fire the same slot twice.
            let from = match last_fire {
                Some(last) if last > now => last,
                _ => now,
            };
            let Some(next) = self.schedule.next_after(&from) else {
                warn!(cron = self.schedule.expr(), "cron expression has no future occurrences");
                break;
            };
            debug!(job = self.job.name(), next = %next.format("%Y-%m-%d %H:%M:%S"), "next run scheduled");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay_until(&next, &now)) => {}
            }

            last_fire = Some(next);
            let ctx = OpContext::new(shutdown.child_token()).with_timeout(self.run_timeout);
            let job = Arc::clone(&self.job);
            info!(job = job.name(), "scheduled run starting");
            tracker.spawn(async move {
                job.execute(ctx).await;
            });
        }

        info!(job = self.job.name(), "scheduler stopped");
    }
}

/// Time from `now` until `next`, zero if already due.
fn delay_until(next: &DateTime<Local>, now: &DateTime<Local>) -> Duration {
    (*next - *now).to_std().unwrap_or(Duration::ZERO)
}
