// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cucumber glue: English phrases of `tests/features` bound to
//! [`Conversation`] methods.
//!
//! Runs against the messenger at `signal-mock.base-url`, skipping scenarios
//! tagged `@scripted` that rely on the canned replies of the in-process mock.
//! Without a base URL that mock is used instead and scenarios tagged `@live`
//! are skipped.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::anyhow;
use cucumber::{Parameter, World as _, given, then, when};
use hf_config::{load_from_env, validate_config};
use hf_error::HarnessError;
use hf_steps::{Conversation, Harness};
use hf_verify::{Confirmation, PredefinedPattern, PredefinedText};
use tracing::warn;
use tracing_subscriber::EnvFilter;

type StepResult = Result<(), HarnessError>;

static HARNESS: OnceLock<Arc<Harness>> = OnceLock::new();

#[derive(Debug, cucumber::World)]
struct FibiWorld {
    conversation: Conversation,
}

impl Default for FibiWorld {
    fn default() -> Self {
        let harness = HARNESS.get().cloned().expect("harness started before scenarios");
        Self {
            conversation: Conversation::new(harness),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Parameter)]
#[param(
    name = "text_label",
    regex = "initial welcome message|welcome back message|confirmation message based on likely consent|confirmation message|denial confirmation message|calendar activity cancelled message"
)]
struct TextLabel(PredefinedText);

impl FromStr for TextLabel {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Debug, Parameter)]
#[param(
    name = "pattern_label",
    regex = "calendar successfully added message containing appointments|calendar successfully added message without schedule|request to post a CalDAV URL|calendar activity cancelled message"
)]
struct PatternLabel(PredefinedPattern);

impl FromStr for PatternLabel {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Debug, Parameter)]
#[param(
    name = "confirmation",
    regex = "task added|task completed|task renamed|set reminder|set timer"
)]
struct ConfirmationLabel(Confirmation);

impl FromStr for ConfirmationLabel {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "task added" => Confirmation::TaskAdded,
            "task completed" => Confirmation::TaskCompleted,
            "task renamed" => Confirmation::TaskRenamed,
            "set reminder" => Confirmation::ReminderSet,
            "set timer" => Confirmation::TimerAdded,
            other => return Err(HarnessError::lookup(format!("unknown confirmation '{other}'"))),
        };
        Ok(Self(kind))
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[given("a user who is new")]
async fn a_user_who_is_new(w: &mut FibiWorld) {
    w.conversation.a_new_user();
}

#[given(expr = "a new user named {string}")]
async fn a_new_user_named(w: &mut FibiWorld, name: String) {
    w.conversation.a_new_user_named(&name);
}

#[given("a Friend")]
async fn a_friend(w: &mut FibiWorld) -> StepResult {
    w.conversation.a_friend().await.map(|_| ())
}

#[given(expr = "a Friend named {string}")]
async fn a_friend_named(w: &mut FibiWorld, name: String) -> StepResult {
    w.conversation.a_friend_named(&name).await.map(|_| ())
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

#[when(expr = "they send {string} to Fibi")]
async fn they_send(w: &mut FibiWorld, text: String) -> StepResult {
    w.conversation.send(&text).await.map(|_| ())
}

#[when(expr = "they send a wake-up time {int} seconds ahead")]
async fn they_send_wake_up_time(w: &mut FibiWorld, seconds: u32) -> StepResult {
    w.conversation.send_wake_up_time(seconds).await
}

#[when("they send their current time")]
async fn they_send_current_time(w: &mut FibiWorld) -> StepResult {
    w.conversation.send_current_time().await
}

#[when(expr = "they react with {string} to {string}")]
async fn they_react(w: &mut FibiWorld, emoji: String, text: String) -> StepResult {
    w.conversation.react(&emoji, &text).await
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

#[when(expr = "{int} minutes pass")]
async fn minutes_pass(w: &mut FibiWorld, minutes: u64) -> StepResult {
    w.conversation
        .time_passes(Duration::from_secs(minutes * 60))
        .await
}

#[when(expr = "{int} minute passes")]
async fn minute_passes(w: &mut FibiWorld, minutes: u64) -> StepResult {
    w.conversation
        .time_passes(Duration::from_secs(minutes * 60))
        .await
}

#[when(expr = "{int} seconds pass")]
async fn seconds_pass(w: &mut FibiWorld, seconds: u64) -> StepResult {
    w.conversation
        .time_passes(Duration::from_secs(seconds))
        .await
}

#[when("the scheduled wake-up time is reached")]
async fn wake_up_time_reached(w: &mut FibiWorld) -> StepResult {
    w.conversation.wake_up_time_reached().await
}

#[when("wait till the reminder time is reached")]
async fn reminder_time_reached(w: &mut FibiWorld) -> StepResult {
    w.conversation.reminder_time_reached().await
}

#[when("the end of the appointment is reached")]
async fn appointment_end_reached(w: &mut FibiWorld) -> StepResult {
    w.conversation.appointment_end_reached().await
}

// ---------------------------------------------------------------------------
// Receiving
// ---------------------------------------------------------------------------

#[then(expr = "they eventually receive {string}")]
async fn eventually_receive(w: &mut FibiWorld, text: String) -> StepResult {
    w.conversation.receives(&text).await
}

#[then(expr = "they eventually receive the {text_label}")]
async fn eventually_receive_text(w: &mut FibiWorld, label: TextLabel) -> StepResult {
    w.conversation.receives_text(label.0).await
}

#[then(expr = "they eventually receive a {pattern_label}")]
async fn eventually_receive_pattern(w: &mut FibiWorld, label: PatternLabel) -> StepResult {
    w.conversation.receives_pattern(label.0).await
}

#[then("they eventually receive any message")]
async fn eventually_receive_any(w: &mut FibiWorld) -> StepResult {
    w.conversation.receives_anything().await
}

#[then(expr = "they eventually receive a message containing {string}")]
async fn eventually_receive_containing(w: &mut FibiWorld, snippet: String) -> StepResult {
    w.conversation.receives_containing(&snippet).await
}

#[then(expr = "they eventually receive a message not containing {string}")]
async fn eventually_receive_not_containing(w: &mut FibiWorld, snippet: String) -> StepResult {
    w.conversation.receives_not_containing(&snippet).await
}

#[then(expr = "they do not receive {string} within {int} seconds")]
async fn do_not_receive(w: &mut FibiWorld, text: String, seconds: u64) -> StepResult {
    w.conversation
        .does_not_receive(&text, Duration::from_secs(seconds))
        .await
}

#[then(expr = "they do not receive the {text_label} within {int} seconds")]
async fn do_not_receive_text(w: &mut FibiWorld, label: TextLabel, seconds: u64) -> StepResult {
    w.conversation
        .does_not_receive(label.0.text(), Duration::from_secs(seconds))
        .await
}

#[then("their last message is eventually confirmed as received")]
async fn last_message_confirmed(w: &mut FibiWorld) -> StepResult {
    w.conversation.last_message_confirmed().await
}

#[then(expr = "they eventually receive a {confirmation} confirmation")]
async fn eventually_receive_confirmation(w: &mut FibiWorld, kind: ConfirmationLabel) -> StepResult {
    w.conversation.receives_confirmation(kind.0).await
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[given(expr = "they add a task {string}")]
async fn they_add_a_task(w: &mut FibiWorld, title: String) -> StepResult {
    w.conversation.add_task(&title).await
}

#[given(expr = "they tell to mark task {string} completed")]
async fn they_mark_task_completed(w: &mut FibiWorld, title: String) -> StepResult {
    w.conversation.mark_task_completed(&title).await
}

#[then(expr = "their task {string} is recorded as {word}")]
async fn task_is_recorded(w: &mut FibiWorld, title: String, state: String) -> StepResult {
    let complete = match state.as_str() {
        "open" => false,
        "completed" => true,
        other => return Err(HarnessError::lookup(format!("unknown task state '{other}'"))),
    };
    w.conversation.task_is_recorded(&title, complete)
}

#[then("they eventually receive a list of the tasks")]
async fn eventually_receive_task_list(w: &mut FibiWorld) -> StepResult {
    w.conversation.receives_task_list().await
}

#[then("they eventually receive a cleaned-up tasks confirmation")]
async fn eventually_receive_cleaned_up_tasks(w: &mut FibiWorld) -> StepResult {
    w.conversation.receives_cleaned_up_tasks().await
}

#[then("they eventually receive a tasks cleaned up confirmation")]
async fn eventually_receive_tasks_cleaned_up(w: &mut FibiWorld) -> StepResult {
    w.conversation.receives_tasks_cleaned_up().await
}

// ---------------------------------------------------------------------------
// Calendars
// ---------------------------------------------------------------------------

#[given("they have a WebDAV calendar")]
async fn they_have_a_calendar(w: &mut FibiWorld) -> StepResult {
    w.conversation.has_calendar().await
}

#[given(expr = "{string} has a WebDAV calendar")]
async fn named_user_has_a_calendar(w: &mut FibiWorld, name: String) -> StepResult {
    w.conversation.named_user_has_calendar(&name).await
}

#[given(expr = "they have {int} appointments today")]
async fn they_have_appointments_today(w: &mut FibiWorld, count: usize) -> StepResult {
    w.conversation.appointments_today(count).await
}

#[given(expr = "they have the appointment {string} ending in {int} minutes")]
async fn they_have_an_appointment_ending(w: &mut FibiWorld, title: String, minutes: i64) -> StepResult {
    w.conversation.appointment_ending_in(&title, minutes).await
}

#[given(expr = "they have a registered calendar with {int} appointments")]
async fn they_have_a_registered_calendar(w: &mut FibiWorld, count: usize) -> StepResult {
    w.conversation.registered_calendar_with(count).await
}

#[when("they send their CalDAV URL to Fibi")]
async fn they_send_caldav_url(w: &mut FibiWorld) -> StepResult {
    w.conversation.send_caldav_url().await
}

#[then("they eventually receive a list of their appointments")]
async fn eventually_receive_appointment_list(w: &mut FibiWorld) -> StepResult {
    w.conversation.receives_appointment_list().await
}

#[then(expr = "they eventually receive a {pattern_label} listing their appointments")]
async fn eventually_receive_pattern_listing_appointments(
    w: &mut FibiWorld,
    label: PatternLabel,
) -> StepResult {
    w.conversation
        .receives_pattern_listing_appointments(label.0)
        .await
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

fn tagged(tags: &[String], tag: &str) -> bool {
    tags.iter().any(|t| t == tag)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_from_env()?;
    let level = config.log_level.clone().unwrap_or_else(|| "info".into());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("hf={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    for warning in validate_config(&config)? {
        warn!(target: "hf.steps", ?warning, "configuration");
    }

    let harness = Harness::start(config).await?;
    let skipped = if harness.is_offline() { "live" } else { "scripted" };
    HARNESS
        .set(Arc::new(harness))
        .map_err(|_| anyhow!("harness already started"))?;

    FibiWorld::cucumber()
        .max_concurrent_scenarios(1)
        .filter_run_and_exit("tests/features", move |feature, _, scenario| {
            !tagged(&feature.tags, skipped) && !tagged(&scenario.tags, skipped)
        })
        .await;
    Ok(())
}
