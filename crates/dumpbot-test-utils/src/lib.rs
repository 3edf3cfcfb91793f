// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for dumpbot integration tests.

pub mod fixtures;
pub mod mock_messenger;

pub use fixtures::{test_config, text_update, write_stub, TARGET_CHAT};
pub use mock_messenger::{MockMessenger, SentDocument, SentText};
