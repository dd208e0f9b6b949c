// SPDX-License-Identifier: MIT OR Apache-2.0
//! Messenger mock client and event-stream ingestor for the HelloFibi harness.
//!
//! Two halves share one [`hf_inbox::Inbox`]:
//!
//! * [`MessengerClient`] posts user messages and reactions to the mock and
//!   answers the "did the assistant send X to user U" questions.
//! * [`Ingestor`] subscribes to the mock's `all_events` stream and turns
//!   assistant messages and delivery receipts into inbox entries. It
//!   re-subscribes whenever the stream ends.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod client;
mod ingest;
mod pattern;
mod placeholder;
mod retry;
mod sse;
mod wire;

pub use cancel::CancelToken;
pub use client::MessengerClient;
pub use ingest::{IngestError, Ingestor, IngestorHandle, Routed, probe_messenger, route_event};
pub use pattern::TextPattern;
pub use placeholder::interpolate_placeholders;
pub use retry::{RetryConfig, RetryOutcome, compute_delay, is_retryable, retry_async};
pub use sse::{SseDecoder, SseEvent};
pub use wire::{Reaction, ReactRequest, SendRequest};
