// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backup orchestration for dumpbot.
//!
//! Ties the producer and the messenger into the backup operation, routes
//! chat commands from the long-poll loop, and coordinates shutdown.

pub mod backup;
pub mod commands;
pub mod dispatcher;
pub mod shutdown;

pub use backup::{run_retention, BackupOperation, ScheduledBackup};
pub use commands::Command;
pub use dispatcher::{CommandDispatcher, DispatcherSettings};
pub use shutdown::{drain, install_signal_handler};
