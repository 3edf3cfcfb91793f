// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: stub dump programs, test configurations and updates.

use std::path::{Path, PathBuf};

use dumpbot_config::DumpbotConfig;
use dumpbot_core::{Chat, ChatId, InboundMessage, Sender, Update};

/// Chat id every test configuration delivers documents to.
pub const TARGET_CHAT: i64 = 1000;

/// Write an executable `/bin/sh` script named `name` into `dir`.
pub fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stub script");
    }
    path
}

/// A dump stub that ignores its arguments and prints `output`.
pub fn printing_stub(dir: &Path, output: &str) -> PathBuf {
    write_stub(dir, "fake-dump", &format!("printf '%s' '{output}'"))
}

/// A dump stub that prints `message` to stderr and exits with `code`.
pub fn failing_stub(dir: &Path, message: &str, code: i32) -> PathBuf {
    write_stub(
        dir,
        "fake-dump",
        &format!("echo '{message}' >&2\nexit {code}"),
    )
}

/// A valid configuration writing artifacts to `backup_dir` using `program`.
///
/// The compressor is `cat`, so artifact contents equal the stub's output.
pub fn test_config(backup_dir: &Path, program: &Path) -> DumpbotConfig {
    let mut config = DumpbotConfig::default();
    config.mysql.database = "shop".to_string();
    config.backup.dir = backup_dir.to_path_buf();
    config.backup.retention_days = 7;
    config.dump.program = program.display().to_string();
    config.dump.extra_args = Vec::new();
    config.dump.compress_command = "cat".to_string();
    config.dump.shell = "bash".to_string();
    config.telegram.bot_token = Some("123456:TEST-TOKEN".to_string());
    config.telegram.chat_id = Some(TARGET_CHAT.to_string());
    config.telegram.retry_delay_secs = 0;
    config
}

/// A text message update from `chat` of type `kind`.
pub fn text_update(update_id: i64, chat: i64, kind: &str, text: &str) -> Update {
    Update {
        update_id,
        message: Some(InboundMessage {
            message_id: update_id,
            chat: Chat {
                id: ChatId(chat),
                kind: kind.to_string(),
            },
            text: Some(text.to_string()),
            from: Some(Sender {
                id: chat,
                username: Some("operator".to_string()),
            }),
        }),
    }
}

/// An update that carries no message (for example an edited message).
pub fn empty_update(update_id: i64) -> Update {
    Update {
        update_id,
        message: None,
    }
}
