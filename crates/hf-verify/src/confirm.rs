// SPDX-License-Identifier: MIT OR Apache-2.0
//! Confirmation messages the assistant sends after acting on a request.

use chrono::{DateTime, NaiveDateTime, Utc};
use hf_error::{ErrorKind, HarnessError, Result};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static TASK_ADDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Added task: (?<title>.+)$").expect("static regex compiles"));
static TASK_COMPLETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?<title>.+) completed$").expect("static regex compiles"));
static TASK_RENAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Renamed task (?<title>.+) \((?<oldTitle>.+)\)$").expect("static regex compiles")
});
static REMINDER_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Set reminder: (?<formattedDateTime>.+)$").expect("static regex compiles")
});
static TIMER_ADDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(__)?Added timer .*$").expect("static regex compiles"));

/// What the assistant is confirming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confirmation {
    /// `Added task: <title>`
    TaskAdded,
    /// `<title> completed`
    TaskCompleted,
    /// `Renamed task <title> (<oldTitle>)`
    TaskRenamed,
    /// `Set reminder: <date-time>`
    ReminderSet,
    /// `Added timer ...`
    TimerAdded,
}

impl Confirmation {
    /// Lowercase snippet a candidate must contain before the regex is tried.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::TaskAdded => "added",
            Self::TaskCompleted => "completed",
            Self::TaskRenamed => "renamed",
            Self::ReminderSet => "set reminder",
            Self::TimerAdded => "added timer",
        }
    }

    /// The full-text pattern.
    pub fn pattern(self) -> &'static Regex {
        match self {
            Self::TaskAdded => &TASK_ADDED,
            Self::TaskCompleted => &TASK_COMPLETED,
            Self::TaskRenamed => &TASK_RENAMED,
            Self::ReminderSet => &REMINDER_SET,
            Self::TimerAdded => &TIMER_ADDED,
        }
    }

    /// Captures of `text` if it is this confirmation.
    pub fn captures(self, text: &str) -> Option<Captures<'_>> {
        if !text.to_lowercase().contains(self.keyword()) {
            return None;
        }
        self.pattern().captures(text)
    }

    /// Clarifying question the assistant may ask first, and the reply to it.
    pub fn check_up(self) -> Option<CheckUp> {
        match self {
            Self::TaskAdded => Some(CheckUp {
                keywords: &["add", "?"],
                answer: "Yes. Add the task.",
            }),
            Self::TaskCompleted => Some(CheckUp {
                keywords: &["mark", "complete"],
                answer: "Yes. Mark the task completed.",
            }),
            Self::TaskRenamed => Some(CheckUp {
                keywords: &["mark", "complete"],
                answer: "Yes. Rename the task completed.",
            }),
            Self::ReminderSet | Self::TimerAdded => None,
        }
    }

    /// Human-readable name for logs and errors.
    pub fn describe(self) -> &'static str {
        match self {
            Self::TaskAdded => "task added confirmation",
            Self::TaskCompleted => "task completed confirmation",
            Self::TaskRenamed => "task renamed confirmation",
            Self::ReminderSet => "set reminder confirmation",
            Self::TimerAdded => "set timer confirmation",
        }
    }
}

/// A question that needs an affirmative answer before the assistant acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckUp {
    /// Lowercase snippets that must all appear.
    pub keywords: &'static [&'static str],
    /// What the user answers.
    pub answer: &'static str,
}

impl CheckUp {
    /// Whether `text` asks this question: a modal verb plus every keyword.
    pub fn is_asked_by(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        let modal = ["would", "shall", "should"].iter().any(|m| lower.contains(m));
        modal && self.keywords.iter().all(|k| lower.contains(k))
    }
}

/// Parse the US medium date-time used in reminder confirmations, in UTC,
/// e.g. `Jan 5, 2025, 3:04:05 PM`.
///
/// Narrow and regular no-break spaces are read as plain spaces.
pub fn parse_reminder_instant(formatted: &str) -> Result<DateTime<Utc>> {
    let normalized: String = formatted
        .trim()
        .chars()
        .map(|c| match c {
            '\u{202F}' | '\u{00A0}' => ' ',
            other => other,
        })
        .collect();
    NaiveDateTime::parse_from_str(&normalized, "%b %d, %Y, %I:%M:%S %p")
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            HarnessError::new(ErrorKind::Parse, "unreadable reminder date-time")
                .with_context("text", formatted)
                .with_source(e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn task_added_requires_the_whole_line() {
        let caps = Confirmation::TaskAdded.captures("Added task: Buy milk").unwrap();
        assert_eq!(&caps["title"], "Buy milk");
        assert!(Confirmation::TaskAdded.captures("I Added task: Buy milk").is_none());
    }

    #[test]
    fn completed_question_is_not_a_confirmation() {
        let question = "Should I mark the task 'Buy milk' as complete?";
        assert!(Confirmation::TaskCompleted.captures(question).is_none());
        assert!(Confirmation::TaskCompleted.check_up().unwrap().is_asked_by(question));
        let caps = Confirmation::TaskCompleted.captures("Buy milk completed").unwrap();
        assert_eq!(&caps["title"], "Buy milk");
    }

    #[test]
    fn renamed_captures_both_titles() {
        let caps = Confirmation::TaskRenamed
            .captures("Renamed task Buy oat milk (Buy milk)")
            .unwrap();
        assert_eq!(&caps["title"], "Buy oat milk");
        assert_eq!(&caps["oldTitle"], "Buy milk");
    }

    #[test]
    fn timer_accepts_the_internal_prefix() {
        assert!(Confirmation::TimerAdded.captures("Added timer 5 minutes").is_some());
        assert!(Confirmation::TimerAdded.captures("__Added timer 5 minutes").is_some());
        assert!(Confirmation::TimerAdded.captures("Timer added").is_none());
    }

    #[test]
    fn keyword_filter_is_case_insensitive() {
        assert!(Confirmation::ReminderSet.captures("Set reminder: soon").is_some());
        assert!(Confirmation::ReminderSet.captures("set reminder: soon").is_none());
    }

    #[test]
    fn check_up_needs_a_modal_verb() {
        let add = Confirmation::TaskAdded.check_up().unwrap();
        assert!(add.is_asked_by("Would you like me to add 'Buy milk'?"));
        assert!(!add.is_asked_by("Do you want me to add 'Buy milk'?"));
        assert!(!add.is_asked_by("Shall I add it."));
        assert!(Confirmation::ReminderSet.check_up().is_none());
    }

    #[test]
    fn reminder_instants_parse_in_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 5, 15, 4, 5).unwrap();
        assert_eq!(parse_reminder_instant("Jan 5, 2025, 3:04:05 PM").unwrap(), expected);
        assert_eq!(
            parse_reminder_instant("Jan 5, 2025, 3:04:05\u{202F}PM").unwrap(),
            expected
        );
        assert_eq!(
            parse_reminder_instant("Jan\u{00A0}5, 2025, 3:04:05 PM").unwrap(),
            expected
        );
        assert_eq!(
            parse_reminder_instant("Dec 31, 2024, 12:00:00 AM").unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn unreadable_reminder_is_a_parse_error() {
        let err = parse_reminder_instant("tomorrow-ish").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    proptest! {
        #[test]
        fn reminder_instants_survive_any_separator(
            secs in 946_684_800_i64..4_102_444_800,
            sep in proptest::sample::select(vec![" ", "\u{202F}", "\u{00A0}"]),
        ) {
            let at = DateTime::from_timestamp(secs, 0).unwrap();
            let text = format!(
                "{}{sep}{}",
                at.format("%b %-d, %Y, %-I:%M:%S"),
                at.format("%p")
            );
            prop_assert_eq!(parse_reminder_instant(&text).unwrap(), at);
        }

        #[test]
        fn task_titles_are_captured_verbatim(title in "[A-Za-z0-9' ]{0,20}[A-Za-z0-9]") {
            let text = format!("Added task: {title}");
            let caps = Confirmation::TaskAdded.captures(&text).unwrap();
            prop_assert_eq!(&caps["title"], title.as_str());
        }
    }
}
