// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire shapes accepted and emitted by the mock.

use axum::response::sse::Event;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A user message posted to `<prefix>/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Assistant's number.
    #[serde(default)]
    pub to: String,
    /// Message text.
    pub message: String,
    /// Client timestamp, echoed back in the delivery receipt.
    #[serde(default)]
    pub timestamp: i64,
    /// Sender's number.
    pub source: String,
    /// Sender's UUID.
    pub source_uuid: String,
    /// Sender's display name.
    #[serde(default)]
    pub source_name: String,
    /// Sender's device.
    #[serde(default)]
    pub source_device: u16,
}

impl InboundMessage {
    /// Parse a request body, naming the first missing required field.
    pub fn from_value(body: Value) -> Result<Self, String> {
        for field in ["source", "sourceUuid", "message"] {
            if body.get(field).and_then(Value::as_str).is_none() {
                return Err(format!("missing field '{field}'"));
            }
        }
        serde_json::from_value(body).map_err(|e| e.to_string())
    }
}

/// A reaction posted to `<prefix>/react`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundReaction {
    /// Assistant's number.
    pub to: String,
    /// Reacting user's number.
    pub from: String,
    /// The reaction.
    pub reaction: ReactionBody,
}

/// Inner reaction object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionBody {
    /// The emoji.
    pub emoji: String,
    /// Author UUID of the reacted-to message.
    pub target_author: String,
    /// Timestamp of the reacted-to message.
    pub target_sent_timestamp: i64,
}

/// One event on the `all_events` stream.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Assistant message to a user (`event: send`).
    Send {
        /// Recipient number.
        to: String,
        /// Message text.
        message: String,
        /// Epoch milliseconds.
        timestamp: i64,
    },
    /// Delivery receipt for user messages (`event: sendReceipt`).
    Receipt {
        /// Number of the user whose messages were received.
        to: String,
        /// Timestamps of the received messages.
        timestamps: Vec<i64>,
    },
    /// Arbitrary event name and data, for exercising unusual streams.
    Raw {
        /// `event:` field.
        event: String,
        /// `data:` field, sent verbatim.
        data: String,
    },
}

impl OutboundEvent {
    /// Assistant message stamped with the current time.
    pub fn send(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Send {
            to: to.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// The SSE `event:` name.
    pub fn name(&self) -> &str {
        match self {
            Self::Send { .. } => "send",
            Self::Receipt { .. } => "sendReceipt",
            Self::Raw { event, .. } => event,
        }
    }

    /// The SSE `data:` payload.
    pub fn data(&self) -> String {
        match self {
            Self::Send {
                to,
                message,
                timestamp,
            } => json!({ "to": to, "message": message, "timestamp": timestamp, "type": "send" })
                .to_string(),
            Self::Receipt { to, timestamps } => {
                json!({ "to": to, "timestamps": timestamps, "type": "sendReceipt" }).to_string()
            }
            Self::Raw { data, .. } => data.clone(),
        }
    }

    pub(crate) fn to_sse(&self) -> Event {
        Event::default().event(self.name()).data(self.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_payload_carries_type() {
        let ev = OutboundEvent::Send {
            to: "+100".into(),
            message: "Hi \"you\"".into(),
            timestamp: 5,
        };
        assert_eq!(ev.name(), "send");
        let v: Value = serde_json::from_str(&ev.data()).unwrap();
        assert_eq!(v["to"], "+100");
        assert_eq!(v["message"], "Hi \"you\"");
        assert_eq!(v["type"], "send");
    }

    #[test]
    fn receipt_payload_lists_timestamps() {
        let ev = OutboundEvent::Receipt {
            to: "+100".into(),
            timestamps: vec![1, 2],
        };
        assert_eq!(ev.name(), "sendReceipt");
        let v: Value = serde_json::from_str(&ev.data()).unwrap();
        assert_eq!(v["timestamps"], json!([1, 2]));
    }

    #[test]
    fn inbound_requires_source_uuid_and_message() {
        let ok = InboundMessage::from_value(json!({
            "to": "+1337", "message": "Hello", "timestamp": 9,
            "source": "+100", "sourceUuid": "u", "sourceName": "Ann", "sourceDevice": 1
        }))
        .unwrap();
        assert_eq!(ok.source_name, "Ann");
        assert_eq!(ok.timestamp, 9);

        let err = InboundMessage::from_value(json!({ "source": "+100", "message": "x" })).unwrap_err();
        assert!(err.contains("sourceUuid"));
        let err = InboundMessage::from_value(json!({ "source": "+100", "sourceUuid": "u" })).unwrap_err();
        assert!(err.contains("message"));
    }
}
