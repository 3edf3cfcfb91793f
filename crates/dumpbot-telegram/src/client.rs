// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot API client over reqwest.
//!
//! Three HTTP clients with separate timeouts serve the three call shapes:
//! long polls, short text messages and large document uploads. Every error
//! produced here has its URL stripped, so the bot token never reaches logs
//! or chat messages.

use std::time::Duration;

use async_trait::async_trait;
use dumpbot_config::model::TelegramConfig;
use dumpbot_core::{Artifact, ChatId, DumpbotError, Messenger, Update};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::form::encode_form;
use crate::markdown::{document_caption, truncate_message};

/// Local slack on top of the server-side long-poll timeout.
const POLL_MARGIN: Duration = Duration::from_secs(5);

/// Description fragment Telegram returns for malformed markup.
const PARSE_ENTITIES_ERROR: &str = "can't parse entities";

const MAX_BODY_SNIPPET: usize = 200;

/// Envelope shared by every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client.
#[derive(Debug)]
pub struct TelegramClient {
    api_url: String,
    token: SecretString,
    poll_http: Client,
    text_http: Client,
    upload_http: Client,
}

impl TelegramClient {
    /// Build a client from the `[telegram]` section.
    pub fn new(config: &TelegramConfig) -> Result<Self, DumpbotError> {
        let token = config
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DumpbotError::Config("telegram.bot_token is not set".to_string()))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: SecretString::from(token.to_string()),
            poll_http: build_http(Duration::from_secs(config.poll_timeout_secs) + POLL_MARGIN)?,
            text_http: build_http(Duration::from_secs(config.text_timeout_secs))?,
            upload_http: build_http(Duration::from_secs(config.upload_timeout_secs))?,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token.expose_secret())
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        http: &Client,
        method: &str,
        pairs: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<T, DumpbotError> {
        let mut request = http
            .post(self.method_url(method))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_form(pairs));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|e| transport(method, e))?;
        decode(method, response).await
    }

    async fn post_text(&self, chat: ChatId, text: &str, markdown: bool) -> Result<(), DumpbotError> {
        let chat = chat.to_string();
        let mut pairs = vec![("chat_id", chat.as_str()), ("text", text)];
        if markdown {
            pairs.push(("parse_mode", "Markdown"));
        }
        self.post_form::<IgnoredAny>(&self.text_http, "sendMessage", &pairs, None)
            .await
            .map(|_| ())
    }
}

fn build_http(timeout: Duration) -> Result<Client, DumpbotError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DumpbotError::Internal(format!("failed to build HTTP client: {}", e.without_url())))
}

fn transport(method: &str, error: reqwest::Error) -> DumpbotError {
    let error = error.without_url();
    let kind = if error.is_timeout() { "timed out" } else { "failed" };
    DumpbotError::transport(format!("{method} request {kind}: {error}"), error)
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_SNIPPET) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Turn an HTTP response into the `result` payload or a delivery error.
async fn decode<T: DeserializeOwned>(method: &str, response: Response) -> Result<T, DumpbotError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| transport(method, e))?;

    let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return Err(DumpbotError::DeliveryFailed {
                status: Some(status.as_u16()),
                message: format!("{method}: unexpected response: {}", snippet(&body)),
                source: Some(Box::new(e)),
            });
        }
    };

    if !status.is_success() || !envelope.ok {
        return Err(DumpbotError::DeliveryFailed {
            status: Some(status.as_u16()),
            message: envelope
                .description
                .unwrap_or_else(|| format!("{method} rejected without description")),
            source: None,
        });
    }

    envelope.result.ok_or_else(|| DumpbotError::DeliveryFailed {
        status: Some(status.as_u16()),
        message: format!("{method}: response has no result"),
        source: None,
    })
}

fn is_markup_error(error: &DumpbotError) -> bool {
    matches!(
        error,
        DumpbotError::DeliveryFailed { status: Some(400), message, .. }
            if message.contains(PARSE_ENTITIES_ERROR)
    )
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, DumpbotError> {
        let offset = offset.to_string();
        let timeout_secs = timeout.as_secs().to_string();
        self.post_form(
            &self.poll_http,
            "getUpdates",
            &[("offset", offset.as_str()), ("timeout", timeout_secs.as_str())],
            Some(timeout + POLL_MARGIN),
        )
        .await
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), DumpbotError> {
        let text = truncate_message(text);
        match self.post_text(chat, text, true).await {
            Err(e) if is_markup_error(&e) => {
                debug!(%chat, "markup rejected, resending as plain text");
                self.post_text(chat, text, false).await
            }
            other => other,
        }
    }

    async fn send_document(&self, chat: ChatId, artifact: &Artifact) -> Result<(), DumpbotError> {
        let file = tokio::fs::File::open(&artifact.path).await.map_err(|e| {
            DumpbotError::DeliveryFailed {
                status: None,
                message: format!("cannot open {}: {e}", artifact.path.display()),
                source: Some(Box::new(e)),
            }
        })?;
        let length = match file.metadata().await {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(file = %artifact.file_name, error = %e, "stat before upload failed");
                artifact.size_bytes
            }
        };

        let document = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(artifact.file_name.clone())
            .mime_str("application/gzip")
            .map_err(|e| transport("sendDocument", e))?;
        let form = Form::new()
            .text("chat_id", chat.to_string())
            .text("caption", document_caption(artifact))
            .text("parse_mode", "Markdown")
            .text("disable_content_type_detection", "true")
            .part("document", document);

        debug!(%chat, file = %artifact.file_name, bytes = length, "uploading document");
        let response = self
            .upload_http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport("sendDocument", e))?;
        decode::<IgnoredAny>("sendDocument", response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123:SECRET".into()),
            api_url: "http://localhost:8081/".into(),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_token() {
        let err = TelegramClient::new(&TelegramConfig::default()).unwrap_err();
        assert!(matches!(err, DumpbotError::Config(_)));
    }

    #[test]
    fn method_url_joins_base_token_and_method() {
        let client = TelegramClient::new(&config()).unwrap();
        assert_eq!(
            client.method_url("getUpdates"),
            "http://localhost:8081/bot123:SECRET/getUpdates"
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let client = TelegramClient::new(&config()).unwrap();
        assert!(!format!("{client:?}").contains("SECRET"));
    }

    #[test]
    fn markup_errors_are_detected() {
        let err = DumpbotError::DeliveryFailed {
            status: Some(400),
            message: "Bad Request: can't parse entities: Can't find end of the entity".into(),
            source: None,
        };
        assert!(is_markup_error(&err));
        let other = DumpbotError::DeliveryFailed {
            status: Some(400),
            message: "Bad Request: chat not found".into(),
            source: None,
        };
        assert!(!is_markup_error(&other));
    }

    #[test]
    fn snippet_shortens_long_bodies() {
        let body = "x".repeat(500);
        assert_eq!(snippet(&body).len(), MAX_BODY_SNIPPET + 3);
    }
}
