// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step vocabulary for HelloFibi scenarios.
//!
//! [`Harness`] is built once per suite and shared; each scenario gets a
//! [`Conversation`] whose methods correspond one-to-one to the English
//! phrases of the feature files. The cucumber glue in the root package only
//! parses phrases and forwards to these methods.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod conversation;
mod harness;

pub use conversation::{Conversation, next_local_instant};
pub use harness::Harness;
