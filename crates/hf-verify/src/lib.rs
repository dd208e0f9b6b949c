// SPDX-License-Identifier: MIT OR Apache-2.0
//! Verification engine of the HelloFibi harness.
//!
//! [`Await`] is the polling primitive everything else is built on.
//! [`Verifier`] turns it into scenario assertions over the shared inbox:
//! eventual receipt of exact texts, snippets and patterns, negative
//! checks, virtual waits for scheduled messages, and the two-phase
//! confirmations (with the check-up handshake) that task, reminder and
//! timer flows end in.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod confirm;
mod poll;
mod verifier;

pub use catalog::{PredefinedPattern, PredefinedText};
pub use confirm::{CheckUp, Confirmation, parse_reminder_instant};
pub use poll::{Await, wait_for};
pub use verifier::Verifier;
