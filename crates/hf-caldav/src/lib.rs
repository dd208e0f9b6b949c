// SPDX-License-Identifier: MIT OR Apache-2.0
//! CalDAV seeding for the HelloFibi harness.
//!
//! Scenarios that involve calendars provision a CalDAV user per simulated
//! participant, create a private calendar for them and append events to it
//! before the assistant is told where the calendar lives.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod ical;

pub use client::{CalDavClient, CalendarAccess, Credentials, credentials_for, users_file};
pub use ical::{escape_text, insert_event, render_calendar, render_event};
