// SPDX-License-Identifier: MIT OR Apache-2.0
//! `<now>` placeholders in outgoing user text.

use chrono::{DateTime, Duration, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static NOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<now(?: plus (\d+) minutes?)?>").expect("static regex compiles")
});

/// Replace every `<now>` and `<now plus N minute(s)>` with the UTC time of
/// day (`HH:MM:SS`) at `now`, shifted by N minutes.
///
/// Each placeholder is rewritten independently; text between them is kept
/// verbatim. A shift too large to represent leaves its placeholder as is.
pub fn interpolate_placeholders(text: &str, now: DateTime<Utc>) -> String {
    NOW.replace_all(text, |caps: &Captures<'_>| {
        let minutes = match caps.get(1) {
            Some(m) => m.as_str().parse::<i64>().ok(),
            None => Some(0),
        };
        match minutes
            .and_then(Duration::try_minutes)
            .and_then(|shift| now.checked_add_signed(shift))
        {
            Some(at) => at.format("%H:%M:%S").to_string(),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}
