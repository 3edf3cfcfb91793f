// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Age-based retention for artifacts in the storage directory.
//!
//! The directory listing is the only source of truth; nothing is cached
//! between sweeps.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use dumpbot_config::DumpbotConfig;
use dumpbot_core::{DumpbotError, ARTIFACT_SUFFIX};
use tracing::{debug, info, warn};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Artifacts removed.
    pub deleted: usize,
    /// Expired artifacts that could not be inspected or removed.
    pub failed: usize,
}

/// Deletes `*.sql.gz` files older than the retention window.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dir: PathBuf,
    retention_days: i64,
}

impl RetentionSweeper {
    pub fn new(dir: impl Into<PathBuf>, retention_days: i64) -> Self {
        Self {
            dir: dir.into(),
            retention_days,
        }
    }

    pub fn from_config(config: &DumpbotConfig) -> Self {
        Self::new(config.backup.dir.clone(), config.backup.retention_days)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sweep relative to the current wall-clock time.
    pub async fn sweep(&self) -> Result<SweepReport, DumpbotError> {
        self.sweep_at(SystemTime::now()).await
    }

    /// Sweep relative to `now`.
    ///
    /// A file is deleted when its modification time is strictly before
    /// `now - retention_days`. A non-positive retention disables the sweep.
    pub async fn sweep_at(&self, now: SystemTime) -> Result<SweepReport, DumpbotError> {
        let mut report = SweepReport::default();
        if self.retention_days <= 0 {
            debug!(retention_days = self.retention_days, "retention disabled");
            return Ok(report);
        }

        let window = Duration::from_secs(self.retention_days.unsigned_abs().saturating_mul(SECS_PER_DAY));
        let Some(cutoff) = now.checked_sub(window) else {
            return Ok(report);
        };

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| DumpbotError::Retention {
                message: format!("cannot list {}: {e}", self.dir.display()),
                source: Some(Box::new(e)),
            })?;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "directory listing interrupted");
                    report.failed += 1;
                    break;
                }
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(ARTIFACT_SUFFIX) {
                continue;
            }

            match entry.file_type().await {
                Ok(kind) if kind.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(file = name, error = %e, "cannot inspect artifact");
                    report.failed += 1;
                    continue;
                }
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(file = name, error = %e, "cannot read artifact age");
                    report.failed += 1;
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    info!(file = name, "deleted expired artifact");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(file = name, error = %e, "failed to delete expired artifact");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_retention_is_a_no_op_even_for_missing_dir() {
        let sweeper = RetentionSweeper::new("/nonexistent/dumpbot", 0);
        assert_eq!(sweeper.sweep().await.unwrap(), SweepReport::default());
    }

    #[tokio::test]
    async fn missing_directory_is_a_retention_error() {
        let sweeper = RetentionSweeper::new("/nonexistent/dumpbot", 7);
        let err = sweeper.sweep().await.unwrap_err();
        assert!(matches!(err, DumpbotError::Retention { .. }));
    }
}
