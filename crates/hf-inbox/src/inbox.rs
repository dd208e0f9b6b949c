// SPDX-License-Identifier: MIT OR Apache-2.0
//! The shared, arrival-ordered message set.

use crate::Message;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Slots = BTreeMap<Reverse<DateTime<Utc>>, Message>;

/// Every message the harness has seen, newest first.
///
/// Written by the event ingestor and the send path, read and marked by
/// assertions. Cloning yields another handle to the same inbox. Readers get
/// snapshots, so a predicate never observes a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    slots: Arc<Mutex<Slots>>,
}

impl Inbox {
    /// An empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `message` unless one with the same `received_at` is present.
    ///
    /// Returns `false` when the message was dropped as a duplicate.
    pub fn add(&self, message: Message) -> bool {
        let mut slots = self.lock();
        let key = Reverse(message.received_at);
        if slots.contains_key(&key) {
            return false;
        }
        slots.insert(key, message);
        true
    }

    /// Number of messages, processed or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the inbox holds no messages.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All messages, newest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().values().cloned().collect()
    }

    /// Unprocessed messages satisfying `pred`, newest first.
    pub fn unprocessed_where(&self, pred: impl Fn(&Message) -> bool) -> Vec<Message> {
        self.lock()
            .values()
            .filter(|m| !m.processed && pred(m))
            .cloned()
            .collect()
    }

    /// The newest message satisfying `pred`, processed or not.
    pub fn newest_where(&self, pred: impl Fn(&Message) -> bool) -> Option<Message> {
        self.lock().values().find(|m| pred(m)).cloned()
    }

    /// If any unprocessed message satisfies `pred`, mark the whole inbox
    /// processed and return `true`.
    ///
    /// Check and reset happen under one lock, so a message arriving in
    /// between cannot be swallowed unseen.
    pub fn consume_if_any(&self, pred: impl Fn(&Message) -> bool) -> bool {
        let mut slots = self.lock();
        let hit = slots.values().any(|m| !m.processed && pred(m));
        if hit {
            for m in slots.values_mut() {
                m.processed = true;
            }
        }
        hit
    }

    /// Mark messages satisfying `pred` processed. Returns how many changed.
    pub fn mark_where(&self, pred: impl Fn(&Message) -> bool) -> usize {
        let mut changed = 0;
        for m in self.lock().values_mut().filter(|m| !m.processed) {
            if pred(m) {
                m.processed = true;
                changed += 1;
            }
        }
        changed
    }

    /// Mark every message processed.
    pub fn mark_all_processed(&self) {
        for m in self.lock().values_mut() {
            m.processed = true;
        }
    }

    /// Remove messages satisfying `pred`. Returns how many were removed.
    pub fn remove_where(&self, pred: impl Fn(&Message) -> bool) -> usize {
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|_, m| !pred(m));
        before - slots.len()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().expect("inbox lock poisoned")
    }
}
