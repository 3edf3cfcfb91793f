// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the producer, the delivery client, and the dispatcher.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// File suffix of every artifact. Retention only ever touches such files.
pub const ARTIFACT_SUFFIX: &str = ".sql.gz";

/// Telegram chat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a `getUpdates` result.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    /// Absent for update kinds other than plain messages.
    #[serde(default)]
    pub message: Option<InboundMessage>,
}

/// An inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<Sender>,
}

/// The chat a message was posted in.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    /// `private`, `group`, `supergroup` or `channel`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// The user who sent a message.
#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

impl InboundMessage {
    /// Returns the message text with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Returns `@username` of the sender, if known.
    pub fn sender_handle(&self) -> Option<String> {
        self.from
            .as_ref()
            .and_then(|f| f.username.as_deref())
            .map(|u| format!("@{u}"))
    }
}

/// One compressed dump file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
    pub database: String,
    pub tables: Vec<String>,
    pub size_bytes: u64,
    pub created_at: DateTime<Local>,
}

impl Artifact {
    /// Size in mebibytes, for log lines and captions.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Table selector as the operator wrote it, or `all tables`.
    pub fn tables_label(&self) -> String {
        tables_label(&self.tables)
    }
}

/// Human-readable table selector: the tables joined by `,`, or `all tables`.
pub fn tables_label(tables: &[String]) -> String {
    if tables.is_empty() {
        "all tables".to_string()
    } else {
        tables.join(",")
    }
}
