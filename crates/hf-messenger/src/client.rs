// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP side of the messenger mock plus the inbox-backed verify family.

use crate::pattern::TextPattern;
use crate::placeholder::interpolate_placeholders;
use crate::wire::{ReactRequest, Reaction, SendRequest};
use chrono::Utc;
use hf_error::{ErrorKind, HarnessError, Result};
use hf_inbox::{Inbox, Message, MessageId, Receipts, received_now};
use hf_store::{User, UserRegistry};
use serde::Serialize;
use tracing::{debug, info};

/// Talks to the messenger mock on behalf of simulated users.
///
/// Cloning yields another handle sharing the same inbox, receipts and
/// registry.
#[derive(Debug, Clone)]
pub struct MessengerClient {
    http: reqwest::Client,
    base_url: String,
    registry: UserRegistry,
    inbox: Inbox,
    receipts: Receipts,
}

impl MessengerClient {
    /// A client for the mock at `base_url` (e.g. `http://host:8080/signal/api/v1`).
    pub fn new(base_url: &str, registry: UserRegistry, inbox: Inbox, receipts: Receipts) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            registry,
            inbox,
            receipts,
        }
    }

    /// `<base>/<path>`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The shared inbox.
    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    /// The shared receipt set.
    pub fn receipts(&self) -> &Receipts {
        &self.receipts
    }

    /// The shared user registry.
    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    // -- Outbound -----------------------------------------------------------

    /// Send `text` from `user` to the assistant and return the message id.
    ///
    /// `<now>` placeholders are expanded first. The message is mirrored into
    /// the inbox before the HTTP call, so it is recorded even if the call
    /// fails.
    pub async fn send_message_to_assistant(&self, user: &User, text: &str) -> Result<MessageId> {
        let now = Utc::now();
        let text = interpolate_placeholders(text, now);
        let timestamp = now.timestamp();
        let assistant = self.registry.assistant();

        self.inbox.add(Message::between(
            &assistant,
            user,
            text.clone(),
            timestamp,
            received_now(),
        ));

        let body = SendRequest {
            to: assistant.number,
            message: text,
            timestamp,
            source: user.number.clone(),
            source_uuid: user.uuid.clone(),
            source_name: user.name.clone(),
            source_device: user.device_id,
        };
        info!(target: "hf.messenger", user = %user.name, text = %body.message, "sending to assistant");
        self.post("send", &body).await?;
        Ok(MessageId(timestamp))
    }

    /// React with `emoji` from `source` to the newest message addressed to
    /// `target` whose text equals `text`.
    pub async fn react_to_message(
        &self,
        source: &User,
        target: &User,
        text: &str,
        emoji: &str,
    ) -> Result<()> {
        let message = self
            .inbox
            .newest_where(|m| m.to_number == target.number && m.text == text)
            .ok_or_else(|| {
                HarnessError::new(ErrorKind::NoReactTarget, "message not found to react to")
                    .with_context("target", &target.name)
                    .with_context("text", text)
            })?;

        let body = ReactRequest {
            to: self.registry.assistant().number,
            from: source.number.clone(),
            reaction: Reaction {
                emoji: emoji.to_string(),
                target_author: message.source_uuid,
                target_sent_timestamp: message.timestamp,
            },
        };
        info!(target: "hf.messenger", user = %source.name, emoji, "reacting to message");
        self.post("react", &body).await
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<()> {
        let url = self.endpoint(path);
        let resp = self.http.post(&url).json(body).send().await.map_err(|e| {
            HarnessError::transport(format!("POST {path} failed"))
                .with_context("url", &url)
                .with_source(e)
        })?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(HarnessError::transport(format!("POST {path} returned {status}"))
                .with_context("url", &url)
                .with_context("body", detail));
        }
        debug!(target: "hf.messenger", %url, %status, "posted");
        Ok(())
    }

    // -- Verify family ------------------------------------------------------

    /// Any unprocessed message to `to` equal to `expected`, ignoring case.
    /// On success the whole inbox is marked processed.
    pub fn verify_sent_text_to(&self, expected: &str, to: &User) -> bool {
        let expected = expected.to_lowercase();
        self.inbox
            .consume_if_any(|m| m.to_number == to.number && m.text.to_lowercase() == expected)
    }

    /// Any unprocessed message to `to` containing `snippet`, ignoring case.
    pub fn verify_sent_text_containing_to(&self, snippet: &str, to: &User) -> bool {
        let snippet = snippet.to_lowercase();
        self.inbox.consume_if_any(|m| {
            m.to_number == to.number && m.text.to_lowercase().contains(&snippet)
        })
    }

    /// Any unprocessed message to `to` fully matching `pattern`.
    pub fn verify_sent_text_like_to(&self, pattern: &TextPattern, to: &User) -> bool {
        self.inbox
            .consume_if_any(|m| m.to_number == to.number && pattern.is_full_match(&m.text))
    }

    /// Any unprocessed message to the user called `name`. Unknown users
    /// never match.
    pub fn verify_sent_to(&self, name: &str) -> bool {
        match self.registry.user_by_name(name) {
            Some(user) => self.inbox.consume_if_any(|m| m.to_number == user.number),
            None => false,
        }
    }

    /// Whether the assistant acknowledged message `id` from `user`.
    pub fn verify_confirmed_message(&self, user: &User, id: MessageId) -> bool {
        self.receipts.contains(&user.name, id)
    }

    // -- Inbox housekeeping -------------------------------------------------

    /// Drop every message addressed to the user called `name`.
    pub fn clear_messages_for(&self, name: &str) -> usize {
        match self.registry.user_by_name(name) {
            Some(user) => self.inbox.remove_where(|m| m.to_number == user.number),
            None => 0,
        }
    }

    /// Mark every message addressed to `name` processed.
    pub fn mark_messages_read(&self, name: &str) -> usize {
        self.inbox.mark_where(|m| m.to_name == name)
    }

    /// Unprocessed messages addressed to `name`, newest first.
    pub fn last_messages_to(&self, name: &str) -> Vec<Message> {
        self.inbox.unprocessed_where(|m| m.to_name == name)
    }
}
