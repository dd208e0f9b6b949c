// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shadow stores for the HelloFibi harness.
//!
//! The harness never looks inside the assistant. Instead it keeps its own
//! record of who is talking ([`UserRegistry`]) and of what the assistant has
//! confirmed so far ([`TaskStore`], [`ReminderStore`], [`AppointmentStore`]),
//! and later assertions compare the assistant's messages against that record.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod appointments;
mod names;
mod reminders;
mod tasks;
mod users;

pub use appointments::{Appointment, AppointmentStore, EVENT_TITLES};
pub use names::NAMES;
pub use reminders::{Reminder, ReminderStore};
pub use tasks::{Task, TaskStore};
pub use users::{ASSISTANT_NAME, ASSISTANT_NUMBER, DEVICE_ID, User, UserRegistry};

use hf_error::{ErrorKind, HarnessError};

/// Lookup failures in the shadow stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No user's number contains the given number.
    #[error("no user with a number containing '{number}'")]
    UnknownNumber {
        /// The number that was looked up.
        number: String,
    },
    /// No user is registered under the given name.
    #[error("unknown user '{name}'")]
    UnknownUser {
        /// The name that was looked up.
        name: String,
    },
    /// No scenario has selected a current user yet.
    #[error("no current user")]
    NoCurrentUser,
    /// The user has no recorded reminder.
    #[error("no reminder recorded for '{name}'")]
    NoReminder {
        /// The user's display name.
        name: String,
    },
}

impl From<StoreError> for HarnessError {
    fn from(err: StoreError) -> Self {
        HarnessError::new(ErrorKind::Lookup, err.to_string()).with_source(err)
    }
}
