// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy with stable error codes for the HelloFibi harness.
//!
//! Every harness failure carries an [`ErrorKind`] (a machine-readable,
//! stable string tag), a human-readable message, an optional cause and
//! key-value context. Build errors fluently with [`HarnessError::new`].
//!
//! The kind also decides what a failure does to a running scenario: parse
//! and lookup failures inside the event ingestor are logged and dropped,
//! everything else fails the scenario (or, for setup, the whole suite).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Machine-readable, stable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Service readiness, calendar seeding or other suite preparation failed.
    Setup,
    /// An HTTP call to the messenger or calendar returned an error.
    Transport,
    /// An inbound event or assistant text could not be parsed.
    Parse,
    /// A phone number, user name or catalog label did not resolve.
    Lookup,
    /// An eventual assertion timed out or a negative assertion was violated.
    Assertion,
    /// No message matched the requested reaction target.
    NoReactTarget,
    /// Configuration is missing or invalid.
    Config,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorKind {
    /// Stable `&'static str` representation (e.g. `"ASSERTION_FAILED"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "SETUP_FAILED",
            Self::Transport => "TRANSPORT_FAILED",
            Self::Parse => "PARSE_FAILED",
            Self::Lookup => "LOOKUP_FAILED",
            Self::Assertion => "ASSERTION_FAILED",
            Self::NoReactTarget => "NO_REACT_TARGET",
            Self::Config => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether an error of this kind ends the current scenario.
    ///
    /// Parse and lookup failures raised while ingesting events are dropped
    /// by the ingestor; every other kind propagates.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse | Self::Lookup)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HarnessError
// ---------------------------------------------------------------------------

/// Unified harness error.
///
/// ```
/// use hf_error::{ErrorKind, HarnessError};
///
/// let err = HarnessError::new(ErrorKind::Assertion, "no welcome message")
///     .with_context("user", "Noah")
///     .with_context("timeout_secs", 120);
/// assert_eq!(err.kind, ErrorKind::Assertion);
/// ```
pub struct HarnessError {
    /// Machine-readable error kind.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

/// Convenience alias used across the harness crates.
pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

impl HarnessError {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Shorthand for [`ErrorKind::Assertion`].
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assertion, message)
    }

    /// Shorthand for [`ErrorKind::Lookup`].
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lookup, message)
    }

    /// Shorthand for [`ErrorKind::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Shorthand for [`ErrorKind::Setup`].
    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Setup, message)
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// Values that fail to serialise are skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.kind.is_fatal()`.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl fmt::Debug for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("HarnessError");
        d.field("kind", &self.kind);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if !self.context.is_empty() {
            let parts: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => format!("{k}={s}"),
                    other => format!("{k}={other}"),
                })
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::new(ErrorKind::Parse, "invalid JSON").with_source(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;

    const ALL_KINDS: &[ErrorKind] = &[
        ErrorKind::Setup,
        ErrorKind::Transport,
        ErrorKind::Parse,
        ErrorKind::Lookup,
        ErrorKind::Assertion,
        ErrorKind::NoReactTarget,
        ErrorKind::Config,
        ErrorKind::Internal,
    ];

    // -- Construction & Display -----------------------------------------

    #[test]
    fn basic_construction() {
        let err = HarnessError::new(ErrorKind::Internal, "boom");
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "boom");
        assert!(err.source.is_none());
        assert!(err.context.is_empty());
    }

    #[test]
    fn display_without_context() {
        let err = HarnessError::new(ErrorKind::NoReactTarget, "nothing to react to");
        assert_eq!(err.to_string(), "[NO_REACT_TARGET] nothing to react to");
    }

    #[test]
    fn display_with_context_is_sorted() {
        let err = HarnessError::assertion("timed out")
            .with_context("user", "Noah")
            .with_context("alias", "welcome");
        assert_eq!(
            err.to_string(),
            "[ASSERTION_FAILED] timed out (alias=welcome, user=Noah)"
        );
    }

    #[test]
    fn debug_with_source() {
        let src = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err = HarnessError::transport("send failed").with_source(src);
        let dbg = format!("{err:?}");
        assert!(dbg.contains("Transport"));
        assert!(dbg.contains("refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    // -- Codes & classification -----------------------------------------

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<&str> = ALL_KINDS.iter().map(|k| k.as_str()).collect();
        assert_eq!(codes.len(), ALL_KINDS.len());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NoReactTarget).unwrap();
        assert_eq!(json, "\"NO_REACT_TARGET\"");
    }

    #[test]
    fn only_parse_and_lookup_are_recoverable() {
        let recoverable: Vec<_> = ALL_KINDS.iter().filter(|k| !k.is_fatal()).collect();
        assert_eq!(recoverable, vec![&ErrorKind::Parse, &ErrorKind::Lookup]);
    }

    #[test]
    fn json_errors_convert_to_parse_failures() {
        let err: HarnessError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(!err.is_fatal());
    }
}
