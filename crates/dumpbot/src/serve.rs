// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dumpbot serve`, `once`, `sweep` and `check-config` implementations.
//!
//! Serve mode starts the cron scheduler (when an expression is configured)
//! and runs the command dispatcher as the main loop until a shutdown signal
//! arrives, then drains in-flight backups for the configured grace period.

use std::sync::Arc;
use std::time::Duration;

use dumpbot_agent::{
    drain, install_signal_handler, run_retention, BackupOperation, CommandDispatcher,
    DispatcherSettings, ScheduledBackup,
};
use dumpbot_config::DumpbotConfig;
use dumpbot_core::{DumpbotError, Messenger, OpContext};
use dumpbot_cron::{CronSchedule, RetentionSweeper, Scheduler};
use dumpbot_telegram::TelegramClient;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Runs the `dumpbot serve` command.
///
/// Falls through to [`run_once`] when `backup.run_once` is set.
pub async fn run_serve(config: DumpbotConfig) -> Result<(), DumpbotError> {
    if config.backup.run_once {
        info!("run_once is set, performing a single backup");
        return run_once(config).await;
    }

    info!(
        database = %config.mysql.database,
        dir = %config.backup.dir.display(),
        "starting dumpbot serve"
    );

    prepare_backup_dir(&config).await?;

    // An invalid expression must stop startup before any polling begins.
    let schedule = config
        .backup
        .cron_expr()
        .map(CronSchedule::parse)
        .transpose()?;

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramClient::new(&config.telegram)?);
    let operation = Arc::new(BackupOperation::from_config(&config, Arc::clone(&messenger))?);

    let shutdown = install_signal_handler();
    let tracker = TaskTracker::new();

    match schedule {
        Some(schedule) => {
            let job = Arc::new(ScheduledBackup::new(
                Arc::clone(&operation),
                RetentionSweeper::from_config(&config),
                Arc::clone(&messenger),
            ));
            Scheduler::new(schedule, job, config.backup.run_timeout())
                .spawn(shutdown.clone(), tracker.clone());
        }
        None => info!("no cron expression configured, scheduled backups disabled"),
    }

    let dispatcher = CommandDispatcher::new(
        messenger,
        operation,
        DispatcherSettings::from_config(&config),
        tracker.clone(),
        shutdown.clone(),
    );
    dispatcher.run().await;

    let grace = Duration::from_secs(config.agent.shutdown_grace_secs);
    if !drain(&tracker, grace).await {
        warn!("exiting with backups still running");
    }

    info!("dumpbot serve shutdown complete");
    Ok(())
}

/// Runs a single backup followed by retention.
///
/// Retention runs whatever the backup outcome; only a backup failure is
/// returned to the caller.
pub async fn run_once(config: DumpbotConfig) -> Result<(), DumpbotError> {
    prepare_backup_dir(&config).await?;

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramClient::new(&config.telegram)?);
    let operation = BackupOperation::from_config(&config, messenger)?;

    let ctx = OpContext::new(install_signal_handler()).with_timeout(config.backup.run_timeout());
    let outcome = operation.run(&ctx).await;
    match &outcome {
        Ok(artifact) => info!(
            file = %artifact.file_name,
            size_mb = artifact.size_mb(),
            "backup complete"
        ),
        Err(e) => error!(error = %e, "backup failed"),
    }

    run_retention(&RetentionSweeper::from_config(&config)).await;
    outcome.map(|_| ())
}

/// Runs one retention pass and reports the counts.
pub async fn run_sweep(config: DumpbotConfig) -> Result<(), DumpbotError> {
    let sweeper = RetentionSweeper::from_config(&config);
    let report = sweeper.sweep().await?;
    info!(
        dir = %sweeper.dir().display(),
        deleted = report.deleted,
        failed = report.failed,
        "retention pass finished"
    );
    Ok(())
}

/// Prints the effective configuration without secrets.
pub fn check_config(config: &DumpbotConfig) -> Result<(), DumpbotError> {
    let summary = dumpbot_config::redacted_summary(config)
        .map_err(|e| DumpbotError::Internal(e.to_string()))?;
    println!("{summary}");
    Ok(())
}

async fn prepare_backup_dir(config: &DumpbotConfig) -> Result<(), DumpbotError> {
    tokio::fs::create_dir_all(&config.backup.dir)
        .await
        .map_err(|e| {
            DumpbotError::Config(format!(
                "cannot create backup directory {}: {e}",
                config.backup.dir.display()
            ))
        })
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dumpbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
