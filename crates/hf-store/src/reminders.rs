// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reminders the assistant has confirmed.

use crate::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A reminder scheduled for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Owner's display name.
    pub username: String,
    /// When the assistant promised to remind.
    pub remind_at: DateTime<Utc>,
}

/// Shared reminder queue in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ReminderStore {
    reminders: Arc<Mutex<VecDeque<Reminder>>>,
}

impl ReminderStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reminder at the tail.
    pub fn add(&self, reminder: Reminder) {
        self.lock().push_back(reminder);
    }

    /// The reminder of `username` nearest the head of the queue.
    ///
    /// Despite the name this is the *oldest* of the user's reminders, which
    /// is the one a scenario with a single reminder cares about.
    pub fn last_added_of(&self, username: &str) -> Result<Reminder, StoreError> {
        self.lock()
            .iter()
            .find(|r| r.username == username)
            .cloned()
            .ok_or_else(|| StoreError::NoReminder {
                name: username.to_string(),
            })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Reminder>> {
        self.reminders.lock().expect("reminder store lock poisoned")
    }
}
