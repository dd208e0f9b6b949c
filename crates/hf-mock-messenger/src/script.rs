// SPDX-License-Identifier: MIT OR Apache-2.0
//! Assistant behaviour plugged into the mock.

use crate::events::{InboundMessage, InboundReaction, OutboundEvent};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

/// An event the mock should emit `after` the triggering request.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    /// Delay measured from the request.
    pub after: Duration,
    /// The event.
    pub event: OutboundEvent,
}

impl Scheduled {
    /// Emit `event` after `after`.
    pub fn after(after: Duration, event: OutboundEvent) -> Self {
        Self { after, event }
    }

    /// Emit `event` immediately.
    pub fn now(event: OutboundEvent) -> Self {
        Self::after(Duration::ZERO, event)
    }
}

/// Reacts to user traffic arriving at the mock.
pub trait Responder: Send + Sync + 'static {
    /// Events to emit in answer to a user message.
    fn respond(&self, message: &InboundMessage, now: DateTime<Utc>) -> Vec<Scheduled>;

    /// Events to emit in answer to a reaction. Nothing by default.
    fn on_reaction(&self, _reaction: &InboundReaction, _now: DateTime<Utc>) -> Vec<Scheduled> {
        Vec::new()
    }
}

/// Never answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Responder for Silent {
    fn respond(&self, _message: &InboundMessage, _now: DateTime<Utc>) -> Vec<Scheduled> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// FibiScript
// ---------------------------------------------------------------------------

/// First-contact greeting.
pub const WELCOME: &str = "Hello! I’m Fibi, your personal daily assistant.\n\
Great to have you here! I can help you manage tasks, appointments,\n\
and routines – especially if ADHD or autism make everyday life challenging.\n\
\n\
Before we begin, I need your consent to store and process your data\n\
in line with our privacy policy. You can learn more here: https://neurospicy.icu/tos.\n\
\n\
Are you ready to get started with me?";

/// Reply to consent.
pub const CONSENT_CONFIRMED: &str = "Fantastic! I'm excited to help you.\n\
Would you prefer to start by connecting your calendar,\n\
setting up a short morning routine, or add something to your to-do list?";

/// Reply to a refused consent.
pub const CONSENT_DENIED: &str = "No problem at all. I understand.\n\
I won't store any of your personal data, except that you declined at this moment.\n\
If you change your mind later, just send me a message, and we can start fresh.";

const WELCOME_BACK: &str = "Welcome back! How can I help you today?";
const FOLLOW_UP: &str = "Is there anything else I can do for you?";
const FALLBACK: &str = "I'm not sure how to help with that yet.";

static ADD_TASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^add task:\s*'(.+)'$").expect("static regex compiles"));
static COMPLETE_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^mark task '(.+)' as completed?$").expect("static regex compiles")
});
static RENAME_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rename task '(.+)' to '(.+)'$").expect("static regex compiles")
});
static LIST_TASKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:list|show)(?: me)?(?: my)? tasks").expect("static regex compiles")
});
static CLEAN_UP_TASKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^clean ?up(?: my)?(?: completed)? tasks").expect("static regex compiles")
});
static REMIND_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^remind me at (\d{1,2}):(\d{2})(?::(\d{2}))?").expect("static regex compiles")
});
static SET_TIMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^set (?:a )?timer (?:for )?(\d+) minutes?").expect("static regex compiles")
});
static WAKE_UP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^i usually wake-up at around (\d{1,2}):(\d{2}):(\d{2})")
        .expect("static regex compiles")
});
static CURRENT_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^my current time is (\d{1,2}):(\d{2})").expect("static regex compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Stage {
    #[default]
    Stranger,
    AwaitingConsent,
    Friend,
    ConfirmingCompletion(String),
}

#[derive(Debug, Default)]
struct Contact {
    stage: Stage,
    tasks: Vec<(String, bool)>,
}

/// Canned assistant: onboarding, tasks, reminders, timers and wake-up
/// greetings, with every answer delayed by `reply_delay`.
///
/// Confirmations are followed by a second message after `follow_up_delay`.
/// Every inbound message is acknowledged with an immediate receipt.
#[derive(Debug)]
pub struct FibiScript {
    reply_delay: Duration,
    follow_up_delay: Duration,
    contacts: Mutex<HashMap<String, Contact>>,
}

impl Default for FibiScript {
    fn default() -> Self {
        Self::new()
    }
}

impl FibiScript {
    /// Script with a 50 ms reply delay and a 1 s follow-up delay.
    pub fn new() -> Self {
        Self {
            reply_delay: Duration::from_millis(50),
            follow_up_delay: Duration::from_secs(1),
            contacts: Mutex::new(HashMap::new()),
        }
    }

    /// Override the reply delay.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    /// Override the gap between a confirmation and its follow-up.
    pub fn with_follow_up_delay(mut self, delay: Duration) -> Self {
        self.follow_up_delay = delay;
        self
    }

    fn reply(&self, to: &str, text: impl Into<String>) -> Scheduled {
        Scheduled::after(self.reply_delay, OutboundEvent::send(to, text))
    }

    fn confirm(&self, to: &str, text: impl Into<String>) -> Vec<Scheduled> {
        vec![
            self.reply(to, text),
            Scheduled::after(
                self.reply_delay + self.follow_up_delay,
                OutboundEvent::send(to, FOLLOW_UP),
            ),
        ]
    }

    fn answer(&self, contact: &mut Contact, to: &str, text: &str, now: DateTime<Utc>) -> Vec<Scheduled> {
        let lower = text.to_lowercase();

        match std::mem::take(&mut contact.stage) {
            Stage::AwaitingConsent if lower.starts_with("yes") => {
                contact.stage = Stage::Friend;
                return vec![self.reply(to, CONSENT_CONFIRMED)];
            }
            Stage::AwaitingConsent if lower.starts_with("no") => {
                contact.stage = Stage::Stranger;
                return vec![self.reply(to, CONSENT_DENIED)];
            }
            Stage::ConfirmingCompletion(title) if lower.starts_with("yes") => {
                contact.stage = Stage::Friend;
                for task in contact.tasks.iter_mut().filter(|(t, _)| *t == title) {
                    task.1 = true;
                }
                return self.confirm(to, format!("{title} completed"));
            }
            Stage::ConfirmingCompletion(_) => contact.stage = Stage::Friend,
            other => contact.stage = other,
        }

        if lower == "hello" || lower == "hi" {
            if contact.stage == Stage::Stranger {
                contact.stage = Stage::AwaitingConsent;
                return vec![self.reply(to, WELCOME)];
            }
            return vec![self.reply(to, WELCOME_BACK)];
        }

        if let Some(caps) = ADD_TASK.captures(text) {
            let title = caps[1].to_string();
            contact.tasks.push((title.clone(), false));
            return self.confirm(to, format!("Added task: {title}"));
        }

        if let Some(caps) = COMPLETE_TASK.captures(text) {
            let title = caps[1].to_string();
            let question = format!("Should I mark the task '{title}' as complete?");
            contact.stage = Stage::ConfirmingCompletion(title);
            return vec![self.reply(to, question)];
        }

        if let Some(caps) = RENAME_TASK.captures(text) {
            let (old, new) = (caps[1].to_string(), caps[2].to_string());
            for task in contact.tasks.iter_mut().filter(|(t, _)| *t == old) {
                task.0 = new.clone();
            }
            return self.confirm(to, format!("Renamed task {new} ({old})"));
        }

        if LIST_TASKS.is_match(text) {
            let open: Vec<_> = contact.tasks.iter().filter(|(_, done)| !done).collect();
            if open.is_empty() {
                return vec![self.reply(to, "You don't have any open tasks.")];
            }
            let lines: Vec<String> = open.iter().map(|(t, _)| format!("- {t}")).collect();
            return vec![self.reply(to, format!("Here are your tasks:\n{}", lines.join("\n")))];
        }

        if CLEAN_UP_TASKS.is_match(text) {
            let before = contact.tasks.len();
            contact.tasks.retain(|(_, done)| !done);
            let removed = before - contact.tasks.len();
            return self.confirm(to, format!("Cleaned up tasks: removed {removed} completed task(s)."));
        }

        if let Some(caps) = REMIND_AT.captures(text) {
            let time = parse_time(&caps[1], &caps[2], caps.get(3).map_or("0", |m| m.as_str()));
            if let Some(time) = time {
                let mut remind_at = now.date_naive().and_time(time).and_utc();
                if remind_at < now - ChronoDuration::seconds(1) {
                    remind_at += ChronoDuration::days(1);
                }
                let formatted = remind_at.format("%b %-d, %Y, %-I:%M:%S %p");
                let mut events = self.confirm(to, format!("Set reminder: {formatted}"));
                events.push(Scheduled::after(
                    until(now, remind_at),
                    OutboundEvent::send(to, "Reminder: this is the moment you asked me about."),
                ));
                return events;
            }
        }

        if let Some(caps) = SET_TIMER.captures(text)
            && let Ok(minutes) = caps[1].parse::<u64>()
        {
            let mut events = self.confirm(to, format!("Added timer {minutes} minutes"));
            events.push(Scheduled::after(
                Duration::from_secs(minutes * 60),
                OutboundEvent::send(to, "Your timer is up!"),
            ));
            return events;
        }

        if let Some(caps) = WAKE_UP.captures(text)
            && let Some(time) = parse_time(&caps[1], &caps[2], &caps[3])
        {
            let formatted = time.format("%-H:%M:%S");
            let mut events = vec![self.reply(
                to,
                format!("Got it. I'll say good morning at around {formatted}."),
            )];
            if let Some(at) = next_local(now, time) {
                events.push(Scheduled::after(
                    until(now, at),
                    OutboundEvent::send(to, "Good morning! Ready to plan your day?"),
                ));
            }
            return events;
        }

        if CURRENT_TIME.is_match(text) {
            return vec![self.reply(to, "Thanks! I adjusted your timezone.")];
        }

        vec![self.reply(to, FALLBACK)]
    }
}

fn parse_time(h: &str, m: &str, s: &str) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, s.parse().ok()?)
}

fn next_local(now: DateTime<Utc>, time: NaiveTime) -> Option<DateTime<Utc>> {
    let local_now = now.with_timezone(&Local);
    let at = local_now
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()?
        .with_timezone(&Utc);
    if at < now - ChronoDuration::seconds(1) {
        Some(at + ChronoDuration::days(1))
    } else {
        Some(at)
    }
}

fn until(now: DateTime<Utc>, at: DateTime<Utc>) -> Duration {
    (at - now).to_std().unwrap_or_default()
}

impl Responder for FibiScript {
    fn respond(&self, message: &InboundMessage, now: DateTime<Utc>) -> Vec<Scheduled> {
        let to = message.source.as_str();
        let receipt = Scheduled::now(OutboundEvent::Receipt {
            to: to.to_string(),
            timestamps: vec![message.timestamp],
        });

        let mut contacts = self.contacts.lock().expect("script lock poisoned");
        let contact = contacts.entry(to.to_string()).or_default();
        let mut events = vec![receipt];
        events.extend(self.answer(contact, to, message.message.trim(), now));
        events
    }

    fn on_reaction(&self, reaction: &InboundReaction, _now: DateTime<Utc>) -> Vec<Scheduled> {
        vec![self.reply(
            &reaction.from,
            format!("Thanks for the {}!", reaction.reaction.emoji),
        )]
    }
}
