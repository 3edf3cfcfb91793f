// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! mandatory values, a numeric target chat, and a database name that is safe
//! to embed in a file name.

use crate::diagnostic::ConfigError;
use crate::model::DumpbotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DumpbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let database = config.mysql.database.trim();
    if database.is_empty() {
        errors.push(ConfigError::MissingKey {
            key: "mysql.database".to_string(),
            env: "MYSQL_DB".to_string(),
        });
    } else if database.contains('/') || database.contains('\0') {
        errors.push(ConfigError::Validation {
            message: format!("mysql.database `{database}` must not contain `/`"),
        });
    }

    if config
        .mysql
        .table_list()
        .iter()
        .any(|t| t.contains('/'))
    {
        errors.push(ConfigError::Validation {
            message: "mysql.tables must not contain `/`".to_string(),
        });
    }

    match config.telegram.bot_token.as_deref().map(str::trim) {
        None | Some("") => errors.push(ConfigError::MissingKey {
            key: "telegram.bot_token".to_string(),
            env: "TELEGRAM_BOT_TOKEN".to_string(),
        }),
        Some(_) => {}
    }

    match config.telegram.chat_id.as_deref().map(str::trim) {
        None | Some("") => errors.push(ConfigError::MissingKey {
            key: "telegram.chat_id".to_string(),
            env: "TELEGRAM_CHAT_ID".to_string(),
        }),
        Some(raw) if raw.parse::<i64>().is_err() => errors.push(ConfigError::Validation {
            message: format!("telegram.chat_id `{raw}` must be a numeric chat id"),
        }),
        Some(_) => {}
    }

    if config.telegram.api_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "telegram.api_url must not be empty".to_string(),
        });
    }

    if config.telegram.poll_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "telegram.poll_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.backup.dir.as_os_str().is_empty() {
        errors.push(ConfigError::Validation {
            message: "backup.dir must not be empty".to_string(),
        });
    }

    if config.backup.run_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "backup.run_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.dump.program.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "dump.program must not be empty".to_string(),
        });
    }

    if config.dump.compress_command.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "dump.compress_command must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
