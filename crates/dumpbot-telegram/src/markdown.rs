// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Legacy-Markdown message texts sent to operators.
//!
//! Telegram's legacy `Markdown` parse mode only treats `_`, `*`, `` ` ``
//! and `[` as markup; those are escaped with a backslash outside code spans.

use dumpbot_core::{Artifact, ChatId};

/// Maximum length of a `sendMessage` text, in characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Maximum length of a `sendDocument` caption, in characters.
pub const MAX_CAPTION_LEN: usize = 1024;

/// Escape legacy Markdown markup characters in free text.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Strip backticks so a value can sit inside a code span.
fn code(value: &str) -> String {
    value.replace('`', "'")
}

/// Cut `text` to Telegram's message limit without splitting a character.
pub fn truncate_message(text: &str) -> &str {
    truncate_chars(text, MAX_MESSAGE_LEN)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Caption attached to every delivered artifact, at most
/// [`MAX_CAPTION_LEN`] characters.
///
/// A long table list is shortened with `…` first so the code spans stay
/// balanced; the hard cut only applies if that is still not enough.
pub fn document_caption(artifact: &Artifact) -> String {
    let tables = code(&artifact.tables_label());
    let caption = caption_with_tables(artifact, &tables);
    let excess = caption.chars().count().saturating_sub(MAX_CAPTION_LEN);
    if excess == 0 {
        return caption;
    }
    let keep = tables.chars().count().saturating_sub(excess + 1);
    let short: String = tables.chars().take(keep).chain(std::iter::once('…')).collect();
    let caption = caption_with_tables(artifact, &short);
    truncate_chars(&caption, MAX_CAPTION_LEN).to_string()
}

fn caption_with_tables(artifact: &Artifact, tables: &str) -> String {
    format!(
        "📊 *MySQL Backup*\n\n🗃 Database: `{}`\n📋 Tables: `{}`\n📅 Time: {}\n📁 File: `{}`",
        code(&artifact.database),
        tables,
        artifact.created_at.format("%Y-%m-%d %H:%M:%S"),
        code(&artifact.file_name),
    )
}

/// Reply to `/help`.
pub fn help_text(tables_label: &str) -> String {
    format!(
        "📋 *Available commands:*\n\n\
         /backup - run a backup now\n\
         /chatid - show this chat's id\n\
         /help - show this help\n\n\
         ℹ️ This bot backs up: `{}`",
        code(tables_label)
    )
}

/// Reply to `/chatid`.
pub fn chat_id_text(chat: ChatId, kind: &str) -> String {
    format!("💬 Chat ID: `{chat}`\nType: {}", escape_markdown(kind))
}

/// Acknowledgment sent when an interactive backup starts.
pub fn backup_started_text(tables_label: &str) -> String {
    format!(
        "🔄 Starting backup of `{}`... please wait.",
        code(tables_label)
    )
}

/// Terminal notice for a successful interactive backup.
pub fn backup_succeeded_text() -> String {
    "✅ Backup finished and delivered.".to_string()
}

/// Terminal notice when the single-slot guard rejected the run.
pub fn backup_busy_text() -> String {
    "⏳ A backup is already running, try again later.".to_string()
}

/// Terminal notice for a failed interactive backup.
pub fn backup_failed_text(error: &str) -> String {
    format!("❌ Backup failed: {}", escape_markdown(error))
}

/// Notice sent to the configured chat when a scheduled backup fails.
pub fn scheduled_failure_text(error: &str) -> String {
    format!("❌ Scheduled backup failed: {}", escape_markdown(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[test]
    fn escapes_legacy_markup() {
        assert_eq!(escape_markdown("a_b*c`d[e]"), "a\\_b\\*c\\`d\\[e]");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_message("hello"), "hello");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_MESSAGE_LEN + 10);
        let cut = truncate_message(&long);
        assert_eq!(cut.chars().count(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn caption_lists_artifact_details() {
        let artifact = Artifact {
            path: "/tmp/shop_orders_20260102_030405.sql.gz".into(),
            file_name: "shop_orders_20260102_030405.sql.gz".into(),
            database: "shop".into(),
            tables: vec!["orders".into()],
            size_bytes: 10,
            created_at: Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };
        let caption = document_caption(&artifact);
        assert!(caption.contains("Database: `shop`"));
        assert!(caption.contains("Tables: `orders`"));
        assert!(caption.contains("2026-01-02 03:04:05"));
        assert!(caption.contains("`shop_orders_20260102_030405.sql.gz`"));
    }

    #[test]
    fn caption_with_many_tables_fits_the_caption_limit() {
        let tables: Vec<String> = (0..300).map(|i| format!("table_number_{i:03}")).collect();
        let artifact = Artifact {
            path: "/tmp/shop_many_20260102_030405.sql.gz".into(),
            file_name: "shop_many_20260102_030405.sql.gz".into(),
            database: "shop".into(),
            tables,
            size_bytes: 10,
            created_at: Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };
        let caption = document_caption(&artifact);
        assert!(caption.chars().count() <= MAX_CAPTION_LEN, "{}", caption.chars().count());
        assert!(caption.contains("Tables: `table_number_000,"));
        assert!(caption.contains("…`"));
        assert!(caption.ends_with("File: `shop_many_20260102_030405.sql.gz`"));
        assert_eq!(caption.matches('`').count() % 2, 0);
    }

    #[test]
    fn chat_id_text_names_chat_and_type() {
        let text = chat_id_text(ChatId(42), "private");
        assert!(text.contains("42"));
        assert!(text.contains("private"));
    }

    #[test]
    fn help_lists_commands_and_tables() {
        let text = help_text("orders,customers");
        for needle in ["/backup", "/chatid", "/help", "orders,customers"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }
}
