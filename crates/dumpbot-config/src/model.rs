// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for dumpbot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level dumpbot configuration.
///
/// Loaded once at startup from TOML files and environment variables and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DumpbotConfig {
    /// Process-level settings (logging, shutdown).
    #[serde(default)]
    pub agent: AgentConfig,

    /// Connection parameters of the database being dumped.
    #[serde(default)]
    pub mysql: MysqlConfig,

    /// Artifact storage, retention, and scheduling.
    #[serde(default)]
    pub backup: BackupConfig,

    /// External dump utility and compression pipeline.
    #[serde(default)]
    pub dump: DumpConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long shutdown waits for in-flight backups before abandoning them.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MysqlConfig {
    #[serde(default = "default_host", deserialize_with = "de::string_like")]
    pub host: String,

    /// Kept as a string: it is only ever handed to the dump utility.
    #[serde(default = "default_port", deserialize_with = "de::string_like")]
    pub port: String,

    #[serde(default = "default_user", deserialize_with = "de::string_like")]
    pub user: String,

    /// Empty or absent means no password.
    #[serde(default, skip_serializing, deserialize_with = "de::opt_string_like")]
    pub password: Option<String>,

    /// Database name. Mandatory.
    #[serde(default, deserialize_with = "de::string_like")]
    pub database: String,

    /// Table selector, comma or whitespace separated. Empty dumps every table.
    #[serde(default, deserialize_with = "de::string_like")]
    pub tables: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: None,
            database: String::new(),
            tables: String::new(),
        }
    }
}

impl MysqlConfig {
    /// Splits the table selector into individual table names.
    pub fn table_list(&self) -> Vec<String> {
        self.tables
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> String {
    "3306".to_string()
}

fn default_user() -> String {
    "root".to_string()
}

/// Artifact storage, retention, and scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Directory that holds the produced artifacts.
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,

    /// Artifacts older than this many days are deleted. `<= 0` disables retention.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Five-field cron expression for scheduled backups. Absent disables the scheduler.
    #[serde(default)]
    pub cron: Option<String>,

    /// Run a single backup and exit.
    #[serde(default, deserialize_with = "de::flag")]
    pub run_once: bool,

    /// Upper bound for one backup run.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Refuse a second concurrent backup instead of starting a redundant dump.
    #[serde(default)]
    pub exclusive: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
            retention_days: default_retention_days(),
            cron: None,
            run_once: false,
            run_timeout_secs: default_run_timeout_secs(),
            exclusive: false,
        }
    }
}

impl BackupConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Returns the cron expression if one is configured and non-blank.
    pub fn cron_expr(&self) -> Option<&str> {
        self.cron.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/var/backups/mysql")
}

fn default_retention_days() -> i64 {
    7
}

fn default_run_timeout_secs() -> u64 {
    2 * 60 * 60
}

/// Dump pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    /// Dump utility executable.
    #[serde(default = "default_dump_program")]
    pub program: String,

    /// Arguments placed between the connection flags and the database name.
    #[serde(default = "default_extra_args")]
    pub extra_args: Vec<String>,

    /// Shell fragment the dump output is piped through. Inserted verbatim.
    #[serde(default = "default_compress_command")]
    pub compress_command: String,

    /// Shell used to run the pipeline. Must support `set -o pipefail`.
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            program: default_dump_program(),
            extra_args: default_extra_args(),
            compress_command: default_compress_command(),
            shell: default_shell(),
        }
    }
}

fn default_dump_program() -> String {
    "mysqldump".to_string()
}

fn default_extra_args() -> Vec<String> {
    [
        "--single-transaction",
        "--quick",
        "--routines",
        "--triggers",
        "--events",
        "--set-gtid-purged=OFF",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_compress_command() -> String {
    "gzip -c".to_string()
}

fn default_shell() -> String {
    "bash".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Mandatory.
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,

    /// Target chat that receives every artifact. Mandatory, numeric.
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub chat_id: Option<String>,

    /// Bot API base URL, without the `/bot<token>` suffix.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Server-side long-poll wait for `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Pause before retrying a failed poll.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Whole-request timeout for document uploads.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Whole-request timeout for text messages.
    #[serde(default = "default_text_timeout_secs")]
    pub text_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            text_timeout_secs: default_text_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    /// Parses the target chat id. Validation guarantees this succeeds for a
    /// loaded configuration.
    pub fn target_chat(&self) -> Option<i64> {
        self.chat_id.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    25
}

fn default_retry_delay_secs() -> u64 {
    3
}

fn default_upload_timeout_secs() -> u64 {
    10 * 60
}

fn default_text_timeout_secs() -> u64 {
    15
}

/// Lenient deserializers for values that arrive from environment variables,
/// where figment has already guessed a type (`3306` becomes an integer,
/// `1` for `RUN_ONCE` becomes an integer, and so on).
mod de {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Float(f64),
        Str(String),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Str(s) => s,
            }
        }
    }

    pub fn string_like<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Scalar::deserialize(d).map(Scalar::into_string)
    }

    pub fn opt_string_like<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Scalar::deserialize(d)? {
            Scalar::Bool(b) => b,
            Scalar::Int(i) => i == 1,
            Scalar::Float(f) => f == 1.0,
            Scalar::Str(s) => matches!(s.trim(), "1" | "true" | "yes" | "on"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_list_splits_commas_and_spaces() {
        let mysql = MysqlConfig {
            tables: "orders, customers,,invoices  items".into(),
            ..MysqlConfig::default()
        };
        assert_eq!(
            mysql.table_list(),
            vec!["orders", "customers", "invoices", "items"]
        );
    }

    #[test]
    fn empty_table_selector_means_all_tables() {
        assert!(MysqlConfig::default().table_list().is_empty());
    }

    #[test]
    fn run_once_accepts_numeric_flag() {
        let config: DumpbotConfig = toml::from_str("[backup]\nrun_once = 1\n").unwrap();
        assert!(config.backup.run_once);
        let config: DumpbotConfig = toml::from_str("[backup]\nrun_once = \"0\"\n").unwrap();
        assert!(!config.backup.run_once);
    }

    #[test]
    fn numeric_port_and_chat_id_become_strings() {
        let config: DumpbotConfig =
            toml::from_str("[mysql]\nport = 3307\n\n[telegram]\nchat_id = -100123\n").unwrap();
        assert_eq!(config.mysql.port, "3307");
        assert_eq!(config.telegram.chat_id.as_deref(), Some("-100123"));
        assert_eq!(config.telegram.target_chat(), Some(-100123));
    }

    #[test]
    fn blank_cron_is_treated_as_absent() {
        let mut backup = BackupConfig::default();
        backup.cron = Some("   ".into());
        assert!(backup.cron_expr().is_none());
        backup.cron = Some("0 2 * * *".into());
        assert_eq!(backup.cron_expr(), Some("0 2 * * *"));
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DumpbotConfig::default();
        assert_eq!(config.mysql.host, "127.0.0.1");
        assert_eq!(config.mysql.port, "3306");
        assert_eq!(config.mysql.user, "root");
        assert_eq!(config.backup.dir, PathBuf::from("/var/backups/mysql"));
        assert_eq!(config.backup.retention_days, 7);
        assert_eq!(config.backup.run_timeout(), Duration::from_secs(7200));
        assert_eq!(config.telegram.poll_timeout_secs, 25);
        assert_eq!(config.telegram.retry_delay_secs, 3);
        assert_eq!(config.dump.compress_command, "gzip -c");
    }
}
