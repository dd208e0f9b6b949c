// SPDX-License-Identifier: MIT OR Apache-2.0
//! Turns the messenger's event stream into inbox entries and receipts.

use crate::cancel::CancelToken;
use crate::retry::{RetryConfig, RetryOutcome, is_retryable, retry_async};
use crate::sse::{SseDecoder, SseEvent};
use futures::StreamExt;
use hf_error::{ErrorKind, HarnessError};
use hf_inbox::{Inbox, Message, MessageId, MessageReceivedConfirmation, Receipts, received_now};
use hf_store::{StoreError, UserRegistry};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Why an event was dropped.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The `data:` payload is not JSON.
    #[error("event data is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// A required field is absent.
    #[error("event is missing field '{0}'")]
    MissingField(&'static str),
    /// The recipient number resolves to no user.
    #[error(transparent)]
    UnknownRecipient(#[from] StoreError),
}

impl From<IngestError> for HarnessError {
    fn from(err: IngestError) -> Self {
        let kind = match err {
            IngestError::UnknownRecipient(_) => ErrorKind::Lookup,
            _ => ErrorKind::Parse,
        };
        HarnessError::new(kind, err.to_string()).with_source(err)
    }
}

/// What happened to a routed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// A `send` event became a message (`inserted` is false for a duplicate).
    Message {
        /// Recipient's display name.
        recipient: String,
        /// Whether the inbox accepted it.
        inserted: bool,
    },
    /// A `sendReceipt` event added receipts.
    Receipts {
        /// Recipient's display name.
        recipient: String,
        /// Newly recorded receipts.
        added: usize,
    },
    /// Any other event type.
    Ignored(String),
}

/// Text view of a JSON value: strings verbatim, other scalars rendered.
fn as_text(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Integer view of a JSON value; anything unparsable reads as 0.
fn as_long(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

/// Apply one decoded event to the inbox or receipt set.
///
/// For `send` events the `message` field is read twice: once as the text
/// and once, parsed as an integer, as the message timestamp. Ordinary text
/// therefore yields timestamp 0.
pub fn route_event(
    event: &SseEvent,
    registry: &UserRegistry,
    inbox: &Inbox,
    receipts: &Receipts,
) -> Result<Routed, IngestError> {
    match event.event_type() {
        "send" => {
            let payload: Value = serde_json::from_str(&event.data).map_err(IngestError::InvalidJson)?;
            let to = payload.get("to").ok_or(IngestError::MissingField("to"))?;
            let recipient = registry.user_by_number(&as_text(Some(to)))?;
            let assistant = registry.assistant();
            let message = payload.get("message");
            let inserted = inbox.add(Message::between(
                &recipient,
                &assistant,
                as_text(message),
                as_long(message),
                received_now(),
            ));
            Ok(Routed::Message {
                recipient: recipient.name,
                inserted,
            })
        }
        "sendReceipt" => {
            let payload: Value = serde_json::from_str(&event.data).map_err(IngestError::InvalidJson)?;
            let to = payload.get("to").ok_or(IngestError::MissingField("to"))?;
            let recipient = registry.user_by_number(&as_text(Some(to)))?;
            let timestamps = payload
                .get("timestamps")
                .and_then(Value::as_array)
                .ok_or(IngestError::MissingField("timestamps"))?;
            let added = timestamps
                .iter()
                .filter(|ts| {
                    receipts.insert(MessageReceivedConfirmation {
                        recipient: recipient.name.clone(),
                        message_id: MessageId(as_long(Some(*ts))),
                    })
                })
                .count();
            Ok(Routed::Receipts {
                recipient: recipient.name,
                added,
            })
        }
        other => Ok(Routed::Ignored(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Ingestor task
// ---------------------------------------------------------------------------

/// Long-running subscriber to `<base>/all_events`.
#[derive(Debug, Clone)]
pub struct Ingestor {
    http: reqwest::Client,
    events_url: String,
    registry: UserRegistry,
    inbox: Inbox,
    receipts: Receipts,
    resubscribe_delay: Duration,
}

impl Ingestor {
    /// An ingestor for the mock at `base_url`.
    pub fn new(base_url: &str, registry: UserRegistry, inbox: Inbox, receipts: Receipts) -> Self {
        Self {
            http: reqwest::Client::new(),
            events_url: events_url(base_url),
            registry,
            inbox,
            receipts,
            resubscribe_delay: Duration::from_millis(100),
        }
    }

    /// Pause between subscriptions after the stream ends or fails.
    pub fn with_resubscribe_delay(mut self, delay: Duration) -> Self {
        self.resubscribe_delay = delay;
        self
    }

    /// Start consuming on a dedicated task.
    pub fn spawn(self) -> IngestorHandle {
        let cancel = CancelToken::new();
        let (tx, rx) = watch::channel(0u64);
        let task = tokio::spawn(self.run(cancel.clone(), tx));
        IngestorHandle {
            cancel,
            subscriptions: rx,
            task,
        }
    }

    async fn run(self, cancel: CancelToken, subscriptions: watch::Sender<u64>) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.subscribe_once(&subscriptions) => match result {
                    Ok(()) => info!(target: "hf.messenger.ingest", "event stream ended, resubscribing"),
                    Err(err) => warn!(target: "hf.messenger.ingest", error = %err, "event stream failed, resubscribing"),
                },
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.resubscribe_delay) => {}
            }
        }
        debug!(target: "hf.messenger.ingest", "ingestor stopped");
    }

    async fn subscribe_once(&self, subscriptions: &watch::Sender<u64>) -> Result<(), HarnessError> {
        let resp = self
            .http
            .get(&self.events_url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| HarnessError::transport("event stream request failed").with_source(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HarnessError::transport(format!("event stream returned {status}")));
        }
        subscriptions.send_modify(|n| *n += 1);
        info!(target: "hf.messenger.ingest", url = %self.events_url, "subscribed to event stream");

        let mut decoder = SseDecoder::new();
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| HarnessError::transport("event stream interrupted").with_source(e))?;
            for event in decoder.push(&chunk) {
                self.handle(&event);
            }
        }
        Ok(())
    }

    fn handle(&self, event: &SseEvent) {
        match route_event(event, &self.registry, &self.inbox, &self.receipts) {
            Ok(Routed::Ignored(kind)) => {
                debug!(target: "hf.messenger.ingest", event = %kind, data = %event.data, "ignoring event");
            }
            Ok(routed) => debug!(target: "hf.messenger.ingest", ?routed, "routed event"),
            Err(err) => {
                warn!(target: "hf.messenger.ingest", error = %err, data = %event.data, "dropping event");
            }
        }
    }
}

fn events_url(base_url: &str) -> String {
    format!("{}/all_events", base_url.trim_end_matches('/'))
}

/// Control handle for a spawned [`Ingestor`].
#[derive(Debug)]
pub struct IngestorHandle {
    cancel: CancelToken,
    subscriptions: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl IngestorHandle {
    /// Successful subscriptions so far.
    pub fn subscriptions(&self) -> u64 {
        *self.subscriptions.borrow()
    }

    /// Wait until at least `count` subscriptions have been established.
    pub async fn wait_for_subscription(&self, count: u64, timeout: Duration) -> Result<(), HarnessError> {
        let mut rx = self.subscriptions.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|n| *n >= count)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(HarnessError::new(ErrorKind::Internal, "ingestor stopped")),
            Err(_) => Err(HarnessError::setup("event stream not subscribed in time")
                .with_context("expected", count)
                .with_context("timeout_ms", timeout.as_millis() as u64)),
        }
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Open the event stream once, with bounded retry, to check the messenger
/// is reachable.
pub async fn probe_messenger(base_url: &str, config: &RetryConfig) -> Result<RetryOutcome<()>, HarnessError> {
    let http = reqwest::Client::new();
    let url = events_url(base_url);
    retry_async(
        config,
        || {
            let http = http.clone();
            let url = url.clone();
            async move {
                let resp = http
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "text/event-stream")
                    .send()
                    .await
                    .map_err(|e| {
                        HarnessError::transport("messenger unreachable")
                            .with_context("url", &url)
                            .with_source(e)
                    })?;
                if resp.status().is_success() {
                    Ok(())
                } else {
                    Err(HarnessError::transport(format!("messenger answered {}", resp.status()))
                        .with_context("url", &url))
                }
            }
        },
        is_retryable,
    )
    .await
    .map_err(|e| {
        HarnessError::setup("messenger did not become ready")
            .with_context("url", base_url)
            .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_store::User;

    fn setup() -> (UserRegistry, Inbox, Receipts) {
        let registry = UserRegistry::new();
        registry.register(User::new("Ann", "+4915112345", "ann"));
        (registry, Inbox::new(), Receipts::new())
    }

    fn event(kind: &str, data: &str) -> SseEvent {
        SseEvent {
            event: Some(kind.into()),
            data: data.into(),
            id: None,
        }
    }

    #[test]
    fn send_event_becomes_a_message_from_the_assistant() {
        let (reg, inbox, receipts) = setup();
        let routed = route_event(
            &event("send", r#"{"to":"+4915112345","message":"Hello Ann","timestamp":1700000000000,"type":"send"}"#),
            &reg,
            &inbox,
            &receipts,
        )
        .unwrap();
        assert_eq!(routed, Routed::Message {
            recipient: "Ann".into(),
            inserted: true
        });
        let m = &inbox.snapshot()[0];
        assert_eq!(m.text, "Hello Ann");
        assert_eq!(m.to_name, "Ann");
        assert_eq!(m.source_name, "Fibi");
        assert_eq!(m.source_number, "+1337");
        // The timestamp is read from the message field, not from "timestamp".
        assert_eq!(m.timestamp, 0);
        assert!(!m.processed);
    }

    #[test]
    fn numeric_message_doubles_as_timestamp() {
        let (reg, inbox, receipts) = setup();
        route_event(&event("send", r#"{"to":"+4915112345","message":"12345"}"#), &reg, &inbox, &receipts)
            .unwrap();
        let m = &inbox.snapshot()[0];
        assert_eq!(m.text, "12345");
        assert_eq!(m.id, MessageId(12345));
    }

    #[test]
    fn recipient_resolves_by_containment() {
        let (reg, inbox, receipts) = setup();
        let routed = route_event(&event("send", r#"{"to":"12345","message":"x"}"#), &reg, &inbox, &receipts)
            .unwrap();
        assert!(matches!(routed, Routed::Message { ref recipient, .. } if recipient == "Ann"));
    }

    #[test]
    fn receipts_are_recorded_per_timestamp() {
        let (reg, inbox, receipts) = setup();
        let routed = route_event(
            &event("sendReceipt", r#"{"to":"+4915112345","timestamps":[1,2,2],"type":"sendReceipt"}"#),
            &reg,
            &inbox,
            &receipts,
        )
        .unwrap();
        assert_eq!(routed, Routed::Receipts {
            recipient: "Ann".into(),
            added: 2
        });
        assert!(receipts.contains("Ann", MessageId(1)));
        assert!(receipts.contains("Ann", MessageId(2)));
        assert!(inbox.is_empty());
    }

    #[test]
    fn bad_events_are_errors_and_leave_state_untouched() {
        let (reg, inbox, receipts) = setup();
        let bad_json = route_event(&event("send", "{not json"), &reg, &inbox, &receipts).unwrap_err();
        assert!(matches!(bad_json, IngestError::InvalidJson(_)));
        assert_eq!(HarnessError::from(bad_json).kind, ErrorKind::Parse);

        let unknown = route_event(&event("send", r#"{"to":"+999","message":"x"}"#), &reg, &inbox, &receipts)
            .unwrap_err();
        assert_eq!(HarnessError::from(unknown).kind, ErrorKind::Lookup);

        let no_ts = route_event(&event("sendReceipt", r#"{"to":"+4915112345"}"#), &reg, &inbox, &receipts)
            .unwrap_err();
        assert!(matches!(no_ts, IngestError::MissingField("timestamps")));
        assert!(inbox.is_empty());
        assert!(receipts.is_empty());
    }

    #[test]
    fn other_event_types_are_ignored() {
        let (reg, inbox, receipts) = setup();
        let routed = route_event(&event("typing", "{}"), &reg, &inbox, &receipts).unwrap();
        assert_eq!(routed, Routed::Ignored("typing".into()));
        let unnamed = SseEvent {
            event: None,
            data: "ping".into(),
            id: None,
        };
        assert_eq!(
            route_event(&unnamed, &reg, &inbox, &receipts).unwrap(),
            Routed::Ignored("message".into())
        );
    }

    #[test]
    fn scalar_views() {
        assert_eq!(as_text(None), "");
        assert_eq!(as_text(Some(&Value::from(5))), "5");
        assert_eq!(as_long(Some(&Value::from("  77 "))), 77);
        assert_eq!(as_long(Some(&Value::from("Hi"))), 0);
        assert_eq!(as_long(Some(&Value::from(3.9))), 3);
        assert_eq!(as_long(None), 0);
    }
}
