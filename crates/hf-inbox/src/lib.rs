// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inbox and delivery receipts for the HelloFibi harness.
//!
//! The [`Inbox`] is the single record of conversation traffic: messages the
//! harness sent on behalf of users (mirrored before the HTTP call) and
//! messages the assistant sent, as decoded from the event stream. Assertions
//! only ever look at unprocessed messages and reset the whole inbox when
//! they succeed.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod inbox;
mod message;
mod receipts;

pub use inbox::Inbox;
pub use message::{Message, MessageId, received_now};
pub use receipts::{MessageReceivedConfirmation, Receipts};
