// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for dumpbot.

use std::path::PathBuf;

use strum::Display;
use thiserror::Error;

use crate::context::CancelReason;

/// The stage of a backup run an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackupStage {
    /// Running the dump pipeline and writing the artifact.
    Dump,
    /// Uploading the artifact to the messaging platform.
    Delivery,
}

/// The primary error type used across all dumpbot crates.
#[derive(Debug, Error)]
pub enum DumpbotError {
    /// Configuration errors (missing mandatory values, bad cron expression).
    #[error("configuration error: {0}")]
    Config(String),

    /// The dump pipeline exited unsuccessfully or produced no readable file.
    #[error("dump failed ({}): {}", exit_label(.status), .output.trim())]
    DumpFailed {
        /// Exit status of the pipeline, `None` when killed by a signal.
        status: Option<i32>,
        /// Captured diagnostic output.
        output: String,
    },

    /// Transport or Bot API failure.
    #[error("delivery failed{}: {message}", status_label(.status))]
    DeliveryFailed {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation was cancelled or ran past its deadline.
    #[error("{stage} {reason}")]
    Canceled {
        stage: BackupStage,
        reason: CancelReason,
    },

    /// The artifact was produced but could not be delivered. The file is kept.
    #[error("artifact kept at {}: {source}", .path.display())]
    Undelivered {
        path: PathBuf,
        source: Box<DumpbotError>,
    },

    /// Another backup holds the single-slot guard.
    #[error("a backup is already running")]
    Busy,

    /// Retention sweep could not run. Never fatal.
    #[error("retention warning: {message}")]
    Retention {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DumpbotError {
    /// Returns the backup stage this error belongs to, if any.
    pub fn stage(&self) -> Option<BackupStage> {
        match self {
            Self::DumpFailed { .. } => Some(BackupStage::Dump),
            Self::DeliveryFailed { .. } | Self::Undelivered { .. } => Some(BackupStage::Delivery),
            Self::Canceled { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Builds a transport-level delivery error without an HTTP status.
    pub fn transport(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::DeliveryFailed {
            status: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}
