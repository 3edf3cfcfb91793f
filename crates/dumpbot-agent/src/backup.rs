// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The backup operation (dump, then deliver) and its scheduled wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use dumpbot_config::DumpbotConfig;
use dumpbot_core::{notify, Artifact, BackupStage, ChatId, DumpbotError, Messenger, OpContext};
use dumpbot_cron::{RetentionSweeper, ScheduledJob};
use dumpbot_dump::DumpProducer;
use dumpbot_telegram::markdown::scheduled_failure_text;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Produces one artifact and delivers it to the configured chat.
pub struct BackupOperation {
    producer: DumpProducer,
    messenger: Arc<dyn Messenger>,
    target: ChatId,
    /// Present when `backup.exclusive` is on.
    slot: Option<Semaphore>,
}

impl BackupOperation {
    pub fn new(
        producer: DumpProducer,
        messenger: Arc<dyn Messenger>,
        target: ChatId,
        exclusive: bool,
    ) -> Self {
        Self {
            producer,
            messenger,
            target,
            slot: exclusive.then(|| Semaphore::new(1)),
        }
    }

    pub fn from_config(
        config: &DumpbotConfig,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self, DumpbotError> {
        let target = config
            .telegram
            .target_chat()
            .ok_or_else(|| DumpbotError::Config("telegram.chat_id must be a numeric chat id".into()))?;
        Ok(Self::new(
            DumpProducer::new(config),
            messenger,
            ChatId(target),
            config.backup.exclusive,
        ))
    }

    /// Chat that receives every artifact.
    pub fn target(&self) -> ChatId {
        self.target
    }

    /// Human-readable table selector.
    pub fn tables_label(&self) -> String {
        dumpbot_core::tables_label(self.producer.tables())
    }

    /// Run one backup.
    ///
    /// A dump failure returns before anything is uploaded. A delivery failure
    /// returns [`DumpbotError::Undelivered`]; the artifact stays on disk in
    /// every case.
    pub async fn run(&self, ctx: &OpContext) -> Result<Artifact, DumpbotError> {
        let _permit = match &self.slot {
            Some(slot) => Some(slot.try_acquire().map_err(|_| DumpbotError::Busy)?),
            None => None,
        };

        let artifact = self.producer.produce(ctx).await?;

        let delivered = tokio::select! {
            result = self.messenger.send_document(self.target, &artifact) => result,
            reason = ctx.done() => Err(DumpbotError::Canceled {
                stage: BackupStage::Delivery,
                reason,
            }),
        };

        match delivered {
            Ok(()) => {
                info!(
                    file = %artifact.file_name,
                    chat_id = self.target.0,
                    "artifact delivered"
                );
                Ok(artifact)
            }
            Err(e) => {
                warn!(file = %artifact.path.display(), error = %e, "delivery failed, artifact kept");
                Err(DumpbotError::Undelivered {
                    path: artifact.path,
                    source: Box::new(e),
                })
            }
        }
    }
}

/// Runs one retention pass and logs the outcome. Never fails.
pub async fn run_retention(sweeper: &RetentionSweeper) {
    match sweeper.sweep().await {
        Ok(report) if report.deleted > 0 || report.failed > 0 => {
            info!(deleted = report.deleted, failed = report.failed, "retention sweep finished");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "retention sweep skipped"),
    }
}

/// Scheduled job: backup, then retention regardless of the backup outcome.
pub struct ScheduledBackup {
    operation: Arc<BackupOperation>,
    sweeper: RetentionSweeper,
    messenger: Arc<dyn Messenger>,
}

impl ScheduledBackup {
    pub fn new(
        operation: Arc<BackupOperation>,
        sweeper: RetentionSweeper,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            operation,
            sweeper,
            messenger,
        }
    }
}

#[async_trait]
impl ScheduledJob for ScheduledBackup {
    fn name(&self) -> &str {
        "scheduled-backup"
    }

    async fn execute(&self, ctx: OpContext) {
        match self.operation.run(&ctx).await {
            Ok(artifact) => {
                info!(file = %artifact.file_name, "scheduled backup complete");
            }
            Err(e) => {
                error!(error = %e, "scheduled backup failed");
                notify(
                    self.messenger.as_ref(),
                    self.operation.target(),
                    &scheduled_failure_text(&e.to_string()),
                )
                .await;
            }
        }
        run_retention(&self.sweeper).await;
    }
}
