// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram delivery client for dumpbot.
//!
//! Implements [`dumpbot_core::Messenger`] on top of the raw Bot API
//! (`getUpdates`, `sendMessage`, `sendDocument`) and owns the operator-facing
//! message texts.

pub mod client;
pub mod form;
pub mod markdown;

pub use client::TelegramClient;
