// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON bodies posted to the messenger mock.

use serde::{Deserialize, Serialize};

/// Body of `POST <base>/send`: a user message addressed to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Assistant's number.
    pub to: String,
    /// Message text after placeholder interpolation.
    pub message: String,
    /// Epoch seconds.
    pub timestamp: i64,
    /// Sender's number.
    pub source: String,
    /// Sender's UUID.
    pub source_uuid: String,
    /// Sender's display name.
    pub source_name: String,
    /// Sender's device.
    pub source_device: u16,
}

/// Body of `POST <base>/react`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactRequest {
    /// Assistant's number.
    pub to: String,
    /// Reacting user's number.
    pub from: String,
    /// The reaction itself.
    pub reaction: Reaction,
}

/// Emoji reaction to an earlier message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// The emoji.
    pub emoji: String,
    /// UUID of the target message's author.
    pub target_author: String,
    /// Timestamp of the target message.
    pub target_sent_timestamp: i64,
}
