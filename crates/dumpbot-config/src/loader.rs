// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dumpbot.toml` > `~/.config/dumpbot/dumpbot.toml` > `/etc/dumpbot/dumpbot.toml`,
//! the historical unprefixed environment variables (`MYSQL_DB`, `TELEGRAM_BOT_TOKEN`, ...),
//! and `DUMPBOT_`-prefixed overrides for every key.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DumpbotConfig;

/// Unprefixed variables whose values are taken verbatim as strings.
///
/// Figment's env provider guesses value types, which would turn a password
/// of `007` into the integer `7`; these bypass that parsing.
pub const LEGACY_STRING_VARS: &[(&str, &str)] = &[
    ("MYSQL_HOST", "mysql.host"),
    ("MYSQL_PORT", "mysql.port"),
    ("MYSQL_USER", "mysql.user"),
    ("MYSQL_PASS", "mysql.password"),
    ("MYSQL_DB", "mysql.database"),
    ("BACKUP_TABLES", "mysql.tables"),
    ("BACKUP_DIR", "backup.dir"),
    ("CRON_EXPR", "backup.cron"),
    ("TELEGRAM_BOT_TOKEN", "telegram.bot_token"),
    ("TELEGRAM_CHAT_ID", "telegram.chat_id"),
];

/// Unprefixed variables that go through figment's typed parsing.
pub const LEGACY_TYPED_VARS: &[(&str, &str)] = &[
    ("RETENTION_DAYS", "backup.retention_days"),
    ("RUN_ONCE", "backup.run_once"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dumpbot/dumpbot.toml` (system-wide)
/// 3. `~/.config/dumpbot/dumpbot.toml` (user XDG config)
/// 4. `./dumpbot.toml` (local directory)
/// 5. Unprefixed legacy environment variables
/// 6. `DUMPBOT_*` environment variables
pub fn load_config() -> Result<DumpbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DumpbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DumpbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DumpbotConfig, figment::Error> {
    with_env(
        Figment::new()
            .merge(Serialized::defaults(DumpbotConfig::default()))
            .merge(Toml::file(path)),
    )
    .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    with_env(
        Figment::new()
            .merge(Serialized::defaults(DumpbotConfig::default()))
            .merge(Toml::file("/etc/dumpbot/dumpbot.toml"))
            .merge(Toml::file(
                dirs::config_dir()
                    .map(|d| d.join("dumpbot/dumpbot.toml"))
                    .unwrap_or_default(),
            ))
            .merge(Toml::file("dumpbot.toml")),
    )
}

/// Layers the legacy and prefixed environment providers on top of `figment`.
fn with_env(figment: Figment) -> Figment {
    let mut figment = figment;

    // An empty variable means "use the default", as it always has.
    for (var, key) in LEGACY_STRING_VARS {
        if let Ok(value) = std::env::var(var)
            && !value.is_empty()
        {
            tracing::debug!(var, key, "applying legacy environment variable");
            figment = figment.merge(Serialized::default(key, value));
        }
    }

    figment.merge(legacy_typed_provider()).merge(env_provider())
}

fn legacy_typed_provider() -> Env {
    Env::raw().filter_map(|key| {
        let upper = key.as_str().to_ascii_uppercase();
        LEGACY_TYPED_VARS
            .iter()
            .find(|(var, _)| *var == upper)
            // Empty values fall back to defaults.
            .filter(|(var, _)| std::env::var(var).is_ok_and(|v| !v.is_empty()))
            .map(|(_, path)| (*path).into())
    })
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `DUMPBOT_TELEGRAM_BOT_TOKEN` must
/// map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("DUMPBOT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("mysql_", "mysql.", 1)
            .replacen("backup_", "backup.", 1)
            .replacen("dump_", "dump.", 1)
            .replacen("telegram_", "telegram.", 1);
        mapped.into()
    })
}
