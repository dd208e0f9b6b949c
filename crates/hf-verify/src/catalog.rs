// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named texts and patterns that scenarios refer to by label.

use hf_error::{HarnessError, Result};
use hf_messenger::TextPattern;
use std::fmt;
use std::str::FromStr;

/// A message the assistant sends word for word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedText {
    /// First-contact greeting asking for consent.
    InitialWelcome,
    /// Reply to an explicit "yes".
    Confirmation,
    /// Reply to an answer that only looks like consent.
    ConfirmationOnLikelyConsent,
    /// Reply to a refusal.
    Denial,
    /// Reply when the user backs out of connecting a calendar.
    CalendarActivityCancelled,
}

impl PredefinedText {
    /// Every entry, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::InitialWelcome,
        Self::Confirmation,
        Self::ConfirmationOnLikelyConsent,
        Self::Denial,
        Self::CalendarActivityCancelled,
    ];

    /// Label used in scenarios.
    pub fn label(self) -> &'static str {
        match self {
            Self::InitialWelcome => "initial welcome message",
            Self::Confirmation => "confirmation message",
            Self::ConfirmationOnLikelyConsent => "confirmation message based on likely consent",
            Self::Denial => "denial confirmation message",
            Self::CalendarActivityCancelled => "calendar activity cancelled message",
        }
    }

    /// The exact text.
    pub fn text(self) -> &'static str {
        match self {
            Self::InitialWelcome => {
                "Hello! I’m Fibi, your personal daily assistant.\n\
                 Great to have you here! I can help you manage tasks, appointments,\n\
                 and routines – especially if ADHD or autism make everyday life challenging.\n\
                 \n\
                 Before we begin, I need your consent to store and process your data\n\
                 in line with our privacy policy. You can learn more here: https://neurospicy.icu/tos.\n\
                 \n\
                 Are you ready to get started with me?"
            }
            Self::Confirmation => {
                "Fantastic! I'm excited to help you.\n\
                 Would you prefer to start by connecting your calendar,\n\
                 setting up a short morning routine, or add something to your to-do list?"
            }
            Self::ConfirmationOnLikelyConsent => {
                "I assume that is consent. Fantastic! I’m excited to help you.\n\
                 Would you prefer to start by connecting your calendar,\n\
                 setting up a short morning routine, or add something to your to-do list?"
            }
            Self::Denial => {
                "No problem at all. I understand.\n\
                 I won't store any of your personal data, except that you declined at this moment.\n\
                 If you change your mind later, just send me a message, and we can start fresh."
            }
            Self::CalendarActivityCancelled => {
                "No worries! I won’t store any calendar info.\n\
                 If you change your mind later, just let me know and we can set it up."
            }
        }
    }
}

impl FromStr for PredefinedText {
    type Err = HarnessError;

    fn from_str(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == label)
            .ok_or_else(|| {
                HarnessError::lookup(format!("no predefined text labelled '{label}'"))
            })
    }
}

impl fmt::Display for PredefinedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A family of assistant messages recognised by a full-text regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedPattern {
    /// Calendar connected, followed by today's schedule.
    CalendarAddedWithAppointments,
    /// Calendar connected, nothing scheduled today.
    CalendarAddedWithoutSchedule,
    /// Any message asking for a CalDAV URL.
    RequestCaldavUrl,
    /// Any message about stopping the calendar setup.
    CalendarActivityCancelled,
}

impl PredefinedPattern {
    /// Every entry, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::CalendarAddedWithAppointments,
        Self::CalendarAddedWithoutSchedule,
        Self::RequestCaldavUrl,
        Self::CalendarActivityCancelled,
    ];

    /// Label used in scenarios.
    pub fn label(self) -> &'static str {
        match self {
            Self::CalendarAddedWithAppointments => {
                "calendar successfully added message containing appointments"
            }
            Self::CalendarAddedWithoutSchedule => "calendar successfully added message without schedule",
            Self::RequestCaldavUrl => "request to post a CalDAV URL",
            Self::CalendarActivityCancelled => "calendar activity cancelled message",
        }
    }

    /// Regex source, matched against the whole message.
    pub fn source(self) -> &'static str {
        match self {
            Self::CalendarAddedWithAppointments => {
                r"Great news—your calendar.? ...? now connected!\nToday, you have:\n((- )?\d\d:\d\d(-\d\d:\d\d)?:? .+\n)+Let me know if you'd like reminders or anything else\."
            }
            Self::CalendarAddedWithoutSchedule => {
                r"Great news—your calendar.? ...? now connected!\nToday, you don't have any appointments.\nLet me know if you'd like reminders or anything else\."
            }
            Self::RequestCaldavUrl => r"(?is).*caldav.*",
            Self::CalendarActivityCancelled => r"(?is).*(stop|abort|cancel)+.*",
        }
    }

    /// The compiled pattern.
    pub fn pattern(self) -> TextPattern {
        TextPattern::new(self.source()).expect("static regex compiles")
    }
}

impl FromStr for PredefinedPattern {
    type Err = HarnessError;

    fn from_str(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.label() == label)
            .ok_or_else(|| {
                HarnessError::lookup(format!("no predefined pattern labelled '{label}'"))
            })
    }
}

impl fmt::Display for PredefinedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_error::ErrorKind;

    #[test]
    fn labels_round_trip() {
        for t in PredefinedText::ALL {
            assert_eq!(t.label().parse::<PredefinedText>().unwrap(), t);
        }
        for p in PredefinedPattern::ALL {
            assert_eq!(p.label().parse::<PredefinedPattern>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_labels_are_lookup_errors() {
        let err = "welcome back message".parse::<PredefinedText>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lookup);
        let err = "nope".parse::<PredefinedPattern>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lookup);
    }

    #[test]
    fn texts_keep_their_line_structure() {
        let welcome = PredefinedText::InitialWelcome.text();
        assert_eq!(welcome.lines().count(), 8);
        assert!(welcome.contains("challenging.\n\nBefore"));
        assert!(!welcome.ends_with('\n'));
        assert!(PredefinedText::Confirmation.text().starts_with("Fantastic! I'm excited"));
    }

    #[test]
    fn calendar_patterns() {
        let with = PredefinedPattern::CalendarAddedWithAppointments.pattern();
        assert!(with.is_full_match(
            "Great news—your calendar is now connected!\nToday, you have:\n\
             - 09:00-10:00: Dentist Appointment\n\
             - 13:15: Team Meeting\n\
             Let me know if you'd like reminders or anything else."
        ));
        assert!(!with.is_full_match(
            "Great news—your calendar is now connected!\nToday, you have:\n\
             Let me know if you'd like reminders or anything else."
        ));

        let without = PredefinedPattern::CalendarAddedWithoutSchedule.pattern();
        assert!(without.is_full_match(
            "Great news—your calendar is now connected!\nToday, you don't have any appointments.\n\
             Let me know if you'd like reminders or anything else."
        ));
    }

    #[test]
    fn loose_patterns_span_lines_and_ignore_case() {
        let caldav = PredefinedPattern::RequestCaldavUrl.pattern();
        assert!(caldav.is_full_match("Sure!\nPlease send me your CalDAV URL."));
        let cancelled = PredefinedPattern::CalendarActivityCancelled.pattern();
        assert!(cancelled.is_full_match("OK, I'll\nCANCEL that."));
        assert!(!cancelled.is_full_match("Carry on."));
    }
}
