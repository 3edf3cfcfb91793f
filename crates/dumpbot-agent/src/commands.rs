// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat commands the dispatcher recognises.

use strum::Display;

/// A recognised slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    /// Run a backup now.
    Backup,
    /// Report the chat's id and type.
    ChatId,
    /// Show usage.
    Help,
}

impl Command {
    /// Classify message text by prefix, so `/backup@my_bot` and
    /// `/backup now` both count as `/backup`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with("/backup") {
            Some(Self::Backup)
        } else if text.starts_with("/chatid") {
            Some(Self::ChatId)
        } else if text.starts_with("/help") {
            Some(Self::Help)
        } else {
            None
        }
    }
}
