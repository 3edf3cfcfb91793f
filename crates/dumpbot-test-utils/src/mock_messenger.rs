// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messenger for deterministic testing.
//!
//! `MockMessenger` implements `Messenger` with queued `getUpdates` batches and
//! captured outbound texts and documents for assertion in tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use dumpbot_core::{Artifact, ChatId, DumpbotError, Messenger, Update};

/// A text message captured by [`MockMessenger::send_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub chat: ChatId,
    pub text: String,
}

/// A document captured by [`MockMessenger::send_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDocument {
    pub chat: ChatId,
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Default)]
struct State {
    batches: VecDeque<Result<Vec<Update>, String>>,
    offsets: Vec<i64>,
    texts: Vec<SentText>,
    documents: Vec<SentDocument>,
    fail_text_containing: Vec<String>,
    fail_documents: bool,
}

/// An in-memory Bot API stand-in.
///
/// `get_updates` pops the next queued batch (or error). With nothing queued
/// it waits for a new batch up to the requested timeout and then returns an
/// empty batch, like a long poll that saw no traffic.
#[derive(Clone, Default)]
pub struct MockMessenger {
    state: Arc<Mutex<State>>,
    inbound: Arc<Notify>,
    outbound: Arc<Notify>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one `getUpdates` result.
    pub async fn push_batch(&self, updates: Vec<Update>) {
        self.state.lock().await.batches.push_back(Ok(updates));
        self.inbound.notify_one();
    }

    /// Queue one failed `getUpdates` call.
    pub async fn push_poll_error(&self, message: &str) {
        self.state
            .lock()
            .await
            .batches
            .push_back(Err(message.to_string()));
        self.inbound.notify_one();
    }

    /// Make every `send_text` whose text contains `needle` fail.
    pub async fn fail_texts_containing(&self, needle: &str) {
        self.state
            .lock()
            .await
            .fail_text_containing
            .push(needle.to_string());
    }

    /// Make every `send_document` fail.
    pub async fn fail_documents(&self) {
        self.state.lock().await.fail_documents = true;
    }

    /// Offsets passed to `get_updates`, in call order.
    pub async fn offsets(&self) -> Vec<i64> {
        self.state.lock().await.offsets.clone()
    }

    /// Texts that were successfully sent.
    pub async fn texts(&self) -> Vec<SentText> {
        self.state.lock().await.texts.clone()
    }

    /// Documents that were successfully sent.
    pub async fn documents(&self) -> Vec<SentDocument> {
        self.state.lock().await.documents.clone()
    }

    /// Waits until at least `count` texts were sent or `within` elapses.
    /// Returns the texts seen at that point.
    pub async fn wait_for_texts(&self, count: usize, within: Duration) -> Vec<SentText> {
        let _ = tokio::time::timeout(within, async {
            loop {
                let notified = self.outbound.notified();
                tokio::pin!(notified);
                // Register before checking so a send in between is not missed.
                notified.as_mut().enable();
                if self.state.lock().await.texts.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await;
        self.texts().await
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, DumpbotError> {
        self.state.lock().await.offsets.push(offset);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.inbound.notified();
            if let Some(next) = self.state.lock().await.batches.pop_front() {
                return next.map_err(|message| DumpbotError::DeliveryFailed {
                    status: None,
                    message,
                    source: None,
                });
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), DumpbotError> {
        let mut state = self.state.lock().await;
        if state
            .fail_text_containing
            .iter()
            .any(|needle| text.contains(needle.as_str()))
        {
            return Err(DumpbotError::DeliveryFailed {
                status: Some(400),
                message: "injected text failure".to_string(),
                source: None,
            });
        }
        state.texts.push(SentText {
            chat,
            text: text.to_string(),
        });
        drop(state);
        self.outbound.notify_waiters();
        Ok(())
    }

    async fn send_document(&self, chat: ChatId, artifact: &Artifact) -> Result<(), DumpbotError> {
        let mut state = self.state.lock().await;
        if state.fail_documents {
            return Err(DumpbotError::DeliveryFailed {
                status: Some(502),
                message: "injected upload failure".to_string(),
                source: None,
            });
        }
        state.documents.push(SentDocument {
            chat,
            path: artifact.path.clone(),
            file_name: artifact.file_name.clone(),
        });
        drop(state);
        self.outbound.notify_waiters();
        Ok(())
    }
}
