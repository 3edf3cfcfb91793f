// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messenger trait for the chat platform that receives artifacts and commands.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::DumpbotError;
use crate::types::{Artifact, ChatId, Update};

/// Bidirectional access to the messaging platform.
///
/// The Telegram client implements this for production; tests use an
/// in-memory double.
#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    /// Long-polls for updates starting at `offset`, waiting up to `timeout`
    /// on the server side.
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, DumpbotError>;

    /// Sends a short text notice.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), DumpbotError>;

    /// Uploads an artifact as a document with a caption describing it.
    async fn send_document(&self, chat: ChatId, artifact: &Artifact) -> Result<(), DumpbotError>;
}

/// Sends a text notice, logging and swallowing any failure.
///
/// Acknowledgments are secondary to the backup itself and must never abort
/// the operation that triggered them.
pub async fn notify(messenger: &dyn Messenger, chat: ChatId, text: &str) {
    if let Err(e) = messenger.send_text(chat, text).await {
        warn!(chat_id = chat.0, error = %e, "failed to send notice");
    }
}
