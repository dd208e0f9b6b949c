// SPDX-License-Identifier: MIT OR Apache-2.0
//! Regular expressions that must match a whole message.

use regex::{Captures, Regex};
use std::fmt;

/// A regex that only matches when it spans the entire text.
///
/// Inline flags such as `(?is)` keep working because the source is wrapped
/// in a non-capturing group before anchoring.
#[derive(Clone)]
pub struct TextPattern {
    source: String,
    anchored: Regex,
}

impl TextPattern {
    /// Compile `pattern` for full-text matching.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            anchored: Regex::new(&format!("^(?:{pattern})$"))?,
        })
    }

    /// Whether the whole of `text` matches.
    pub fn is_full_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }

    /// Capture groups of a full match.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.anchored.captures(text)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextPattern").field(&self.source).finish()
    }
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
