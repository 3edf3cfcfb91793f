// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-poll command dispatcher.
//!
//! Polls `getUpdates` from an in-memory cursor and routes `/backup`,
//! `/chatid` and `/help`. The cursor moves past every update in a batch,
//! whether or not handling it succeeded, and never moves backwards.
//! `/backup` runs on the task tracker so a long dump never stalls polling.

use std::sync::Arc;
use std::time::Duration;

use dumpbot_config::DumpbotConfig;
use dumpbot_core::{notify, ChatId, DumpbotError, InboundMessage, Messenger, OpContext, Update};
use dumpbot_telegram::markdown::{
    backup_busy_text, backup_failed_text, backup_started_text, backup_succeeded_text,
    chat_id_text, help_text,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::backup::BackupOperation;
use crate::commands::Command;

/// Timing knobs for the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherSettings {
    /// Server-side long-poll timeout.
    pub poll_timeout: Duration,
    /// Pause after a failed poll.
    pub retry_delay: Duration,
    /// Bound on each interactive backup.
    pub run_timeout: Duration,
}

impl DispatcherSettings {
    pub fn from_config(config: &DumpbotConfig) -> Self {
        Self {
            poll_timeout: Duration::from_secs(config.telegram.poll_timeout_secs),
            retry_delay: Duration::from_secs(config.telegram.retry_delay_secs),
            run_timeout: config.backup.run_timeout(),
        }
    }
}

/// Routes inbound chat commands.
pub struct CommandDispatcher {
    messenger: Arc<dyn Messenger>,
    operation: Arc<BackupOperation>,
    settings: DispatcherSettings,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    cursor: i64,
}

impl CommandDispatcher {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        operation: Arc<BackupOperation>,
        settings: DispatcherSettings,
        tracker: TaskTracker,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            messenger,
            operation,
            settings,
            tracker,
            shutdown,
            cursor: 0,
        }
    }

    /// Next `getUpdates` offset.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Poll until shutdown. Poll failures are logged and retried forever.
    pub async fn run(mut self) {
        info!(
            poll_timeout_secs = self.settings.poll_timeout.as_secs(),
            "command dispatcher started"
        );
        let shutdown = self.shutdown.clone();

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.poll_once() => result,
            };

            if let Err(e) = polled {
                warn!(error = %e, cursor = self.cursor, "polling failed, retrying");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.settings.retry_delay) => {}
                }
            }
        }

        info!(cursor = self.cursor, "command dispatcher stopped");
    }

    /// One `getUpdates` round trip. The cursor is untouched on failure.
    pub async fn poll_once(&mut self) -> Result<usize, DumpbotError> {
        let updates = self
            .messenger
            .get_updates(self.cursor, self.settings.poll_timeout)
            .await?;
        let count = updates.len();
        self.process_batch(updates).await;
        Ok(count)
    }

    /// Handle a batch in order, advancing the cursor before each update.
    pub async fn process_batch(&mut self, updates: Vec<Update>) {
        for update in updates {
            self.cursor = self.cursor.max(update.update_id.saturating_add(1));
            let Some(message) = update.message else {
                continue;
            };
            if let Err(e) = self.handle(&message).await {
                warn!(update_id = update.update_id, error = %e, "command handling failed");
            }
        }
    }

    async fn handle(&self, message: &InboundMessage) -> Result<(), DumpbotError> {
        let Some(command) = Command::parse(message.trimmed_text()) else {
            return Ok(());
        };
        let chat = message.chat.id;
        info!(
            %command,
            chat_id = chat.0,
            from = message.sender_handle().as_deref().unwrap_or("-"),
            "command received"
        );

        match command {
            Command::Backup => {
                self.spawn_backup(chat);
                Ok(())
            }
            Command::ChatId => {
                self.messenger
                    .send_text(chat, &chat_id_text(chat, &message.chat.kind))
                    .await
            }
            Command::Help => {
                self.messenger
                    .send_text(chat, &help_text(&self.operation.tables_label()))
                    .await
            }
        }
    }

    fn spawn_backup(&self, reply_to: ChatId) {
        let operation = Arc::clone(&self.operation);
        let messenger = Arc::clone(&self.messenger);
        let ctx = OpContext::new(self.shutdown.child_token()).with_timeout(self.settings.run_timeout);
        self.tracker.spawn(async move {
            interactive_backup(operation, messenger, reply_to, ctx).await;
        });
    }
}

/// `/backup`: one starting notice, the run, one terminal notice.
async fn interactive_backup(
    operation: Arc<BackupOperation>,
    messenger: Arc<dyn Messenger>,
    reply_to: ChatId,
    ctx: OpContext,
) {
    notify(
        messenger.as_ref(),
        reply_to,
        &backup_started_text(&operation.tables_label()),
    )
    .await;

    let outcome = match operation.run(&ctx).await {
        Ok(artifact) => {
            info!(file = %artifact.file_name, chat_id = reply_to.0, "interactive backup complete");
            backup_succeeded_text()
        }
        Err(DumpbotError::Busy) => {
            debug!(chat_id = reply_to.0, "backup rejected, another run holds the slot");
            backup_busy_text()
        }
        Err(e) => {
            error!(error = %e, chat_id = reply_to.0, "interactive backup failed");
            backup_failed_text(&e.to_string())
        }
    };

    notify(messenger.as_ref(), reply_to, &outcome).await;
}
