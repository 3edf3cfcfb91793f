// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for dumpbot.
//!
//! Holds the error taxonomy, the artifact and Bot API update types, the
//! cancellation context shared by every long-running operation, and the
//! [`Messenger`] trait that the delivery client implements.

pub mod context;
pub mod error;
pub mod traits;
pub mod types;

pub use context::{CancelReason, OpContext};
pub use error::{BackupStage, DumpbotError};
pub use traits::{Messenger, notify};
pub use types::{tables_label, ARTIFACT_SUFFIX, Artifact, Chat, ChatId, InboundMessage, Sender, Update};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dumpbot_error_has_all_variants() {
        let _config = DumpbotError::Config("test".into());
        let _dump = DumpbotError::DumpFailed {
            status: Some(2),
            output: "boom".into(),
        };
        let _delivery = DumpbotError::DeliveryFailed {
            status: Some(400),
            message: "bad request".into(),
            source: None,
        };
        let _canceled = DumpbotError::Canceled {
            stage: BackupStage::Dump,
            reason: CancelReason::Canceled,
        };
        let _undelivered = DumpbotError::Undelivered {
            path: "/tmp/x.sql.gz".into(),
            source: Box::new(DumpbotError::Internal("test".into())),
        };
        let _busy = DumpbotError::Busy;
        let _retention = DumpbotError::Retention {
            message: "test".into(),
            source: None,
        };
        let _io = DumpbotError::Io(std::io::Error::other("test"));
        let _internal = DumpbotError::Internal("test".into());
    }

    #[test]
    fn backup_stage_display() {
        assert_eq!(BackupStage::Dump.to_string(), "dump");
        assert_eq!(BackupStage::Delivery.to_string(), "delivery");
    }
}
