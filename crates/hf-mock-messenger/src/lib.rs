// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-process messenger mock.
//!
//! Serves the three endpoints the harness talks to (`send`, `react`,
//! `all_events`) and hands every user message to a [`Responder`]. The
//! bundled [`FibiScript`] answers like a small, deterministic assistant so
//! the harness can be exercised without the real one.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod events;
mod script;
mod server;

pub use events::{InboundMessage, InboundReaction, OutboundEvent, ReactionBody};
pub use script::{
    CONSENT_CONFIRMED, CONSENT_DENIED, FibiScript, Responder, Scheduled, Silent, WELCOME,
};
pub use server::{DEFAULT_PREFIX, MockState, RunningMock, build_app};
