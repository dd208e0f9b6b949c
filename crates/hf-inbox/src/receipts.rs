// SPDX-License-Identifier: MIT OR Apache-2.0
//! Delivery receipts reported by the assistant.

use crate::MessageId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// The assistant confirmed receiving `message_id` from `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageReceivedConfirmation {
    /// Display name of the user the receipt was addressed to.
    pub recipient: String,
    /// The confirmed message.
    pub message_id: MessageId,
}

/// Set of receipts, deduplicated on `(recipient, message_id)`.
#[derive(Debug, Clone, Default)]
pub struct Receipts {
    set: Arc<Mutex<HashSet<MessageReceivedConfirmation>>>,
}

impl Receipts {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a receipt. Returns `false` if it was already known.
    pub fn insert(&self, confirmation: MessageReceivedConfirmation) -> bool {
        self.lock().insert(confirmation)
    }

    /// Whether `recipient` has a receipt for `message_id`.
    pub fn contains(&self, recipient: &str, message_id: MessageId) -> bool {
        self.lock().contains(&MessageReceivedConfirmation {
            recipient: recipient.to_string(),
            message_id,
        })
    }

    /// Number of distinct receipts.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no receipt has arrived.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<MessageReceivedConfirmation>> {
        self.set.lock().expect("receipt set lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(recipient: &str, id: i64) -> MessageReceivedConfirmation {
        MessageReceivedConfirmation {
            recipient: recipient.into(),
            message_id: MessageId(id),
        }
    }

    #[test]
    fn duplicates_collapse() {
        let receipts = Receipts::new();
        assert!(receipts.insert(receipt("Ann", 7)));
        assert!(!receipts.insert(receipt("Ann", 7)));
        assert_eq!(receipts.len(), 1);
    }

    #[test]
    fn membership_is_by_pair() {
        let receipts = Receipts::new();
        receipts.insert(receipt("Ann", 7));
        receipts.insert(receipt("Ben", 7));
        assert_eq!(receipts.len(), 2);
        assert!(receipts.contains("Ann", MessageId(7)));
        assert!(!receipts.contains("Ann", MessageId(8)));
        assert!(!receipts.contains("Cat", MessageId(7)));
    }
}
