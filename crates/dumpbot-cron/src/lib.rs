// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron scheduler and retention sweeper for dumpbot.

pub mod retention;
pub mod scheduler;

pub use retention::{RetentionSweeper, SweepReport};
pub use scheduler::{CronSchedule, ScheduledJob, Scheduler};
