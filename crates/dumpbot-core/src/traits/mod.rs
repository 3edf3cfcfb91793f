// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the dispatcher/backup logic and the messaging platform.

pub mod messenger;

pub use messenger::{Messenger, notify};
