// SPDX-License-Identifier: MIT OR Apache-2.0
//! Messages exchanged between simulated users and the assistant.

use chrono::{DateTime, SubsecRound, Utc};
use hf_store::User;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a message: the sender's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(ts: i64) -> Self {
        Self(ts)
    }
}

/// The current instant at the inbox's resolution (milliseconds).
pub fn received_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// One message in the inbox.
///
/// Identity is the arrival instant: two messages are equal, hash alike and
/// order alike exactly when their `received_at` values match, whatever their
/// content. The inbox relies on this to drop a second message arriving in
/// the same millisecond.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// `MessageId(timestamp)`.
    pub id: MessageId,
    /// Arrival instant on the harness side.
    pub received_at: DateTime<Utc>,
    /// Recipient's number.
    pub to_number: String,
    /// Recipient's UUID.
    pub to_uuid: String,
    /// Recipient's display name.
    pub to_name: String,
    /// Recipient's device.
    pub to_device: u16,
    /// Message body.
    pub text: String,
    /// Sender's number.
    pub source_number: String,
    /// Sender's UUID.
    pub source_uuid: String,
    /// Sender's display name.
    pub source_name: String,
    /// Sender's device.
    pub source_device: u16,
    /// Sender-side timestamp.
    pub timestamp: i64,
    /// Set once an assertion has consumed the message.
    pub processed: bool,
}

impl Message {
    /// A fresh, unprocessed message from `from` to `to`.
    pub fn between(
        to: &User,
        from: &User,
        text: impl Into<String>,
        timestamp: i64,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId(timestamp),
            received_at,
            to_number: to.number.clone(),
            to_uuid: to.uuid.clone(),
            to_name: to.name.clone(),
            to_device: to.device_id,
            text: text.into(),
            source_number: from.number.clone(),
            source_uuid: from.uuid.clone(),
            source_name: from.name.clone(),
            source_device: from.device_id,
            timestamp,
            processed: false,
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.received_at == other.received_at
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.received_at.hash(state);
    }
}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Message {
    fn cmp(&self, other: &Self) -> Ordering {
        self.received_at.cmp(&other.received_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn users() -> (User, User) {
        (User::new("Ann", "+100", "ann"), User::new("Fibi", "+1337", "fibi"))
    }

    #[test]
    fn identity_is_received_at_only() {
        let (ann, fibi) = users();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let a = Message::between(&ann, &fibi, "hello", 1, at);
        let b = Message::between(&fibi, &ann, "something else", 2, at);
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn between_copies_both_parties() {
        let (ann, fibi) = users();
        let m = Message::between(&ann, &fibi, "hi", 42, received_now());
        assert_eq!(m.id, MessageId(42));
        assert_eq!(m.to_name, "Ann");
        assert_eq!(m.source_uuid, "fibi");
        assert!(!m.processed);
    }

    #[test]
    fn received_now_has_millisecond_resolution() {
        assert_eq!(received_now().timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
