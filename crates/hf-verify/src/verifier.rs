// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenario-level assertions over the shared inbox.

use crate::confirm::{Confirmation, parse_reminder_instant};
use crate::poll::Await;
use chrono::{DateTime, Utc};
use hf_config::TimeoutConfig;
use hf_error::{HarnessError, Result};
use hf_inbox::{Message, MessageId};
use hf_messenger::{MessengerClient, TextPattern};
use hf_store::{AppointmentStore, Reminder, ReminderStore, Task, TaskStore, User};
use std::time::Duration;
use tracing::{debug, info};

/// Eventual assertions about what the assistant sends.
///
/// Positive assertions poll the inbox until a match appears or the
/// assertion timeout elapses. A match marks the whole inbox processed, so
/// the next assertion only sees what arrives afterwards.
#[derive(Debug, Clone)]
pub struct Verifier {
    client: MessengerClient,
    tasks: TaskStore,
    reminders: ReminderStore,
    appointments: AppointmentStore,
    timeouts: TimeoutConfig,
}

impl Verifier {
    /// A verifier over `client`'s inbox, recording confirmations in the
    /// given stores.
    pub fn new(
        client: MessengerClient,
        tasks: TaskStore,
        reminders: ReminderStore,
        appointments: AppointmentStore,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            client,
            tasks,
            reminders,
            appointments,
            timeouts,
        }
    }

    /// The messenger client.
    pub fn client(&self) -> &MessengerClient {
        &self.client
    }

    /// Timing in effect.
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    fn eventually(&self, alias: String) -> Await {
        Await::new()
            .alias(alias)
            .at_most(self.timeouts.assertion())
            .poll_interval(self.timeouts.poll_interval())
    }

    fn unprocessed(&self, user: &User) -> Vec<Message> {
        self.client.last_messages_to(&user.name)
    }

    // -- Receives -----------------------------------------------------------

    /// `user` eventually receives exactly `text` (case-insensitive).
    pub async fn receives_exact(&self, user: &User, text: &str) -> Result<()> {
        self.eventually(format!("Verify Fibi sent '{text}' to '{}'", user.name))
            .until(|| self.client.verify_sent_text_to(text, user))
            .await
    }

    /// `user` eventually receives a message containing `snippet`.
    pub async fn receives_contains(&self, user: &User, snippet: &str) -> Result<()> {
        self.eventually(format!("Verify Fibi sent '{snippet}' to '{}'", user.name))
            .until(|| self.client.verify_sent_text_containing_to(snippet, user))
            .await
    }

    /// Like [`Self::receives_contains`] with an explicit budget.
    pub async fn receives_contains_within(
        &self,
        user: &User,
        snippet: &str,
        within: Duration,
    ) -> Result<()> {
        self.eventually(format!("Verify Fibi sent '{snippet}' to '{}'", user.name))
            .at_most(within)
            .until(|| self.client.verify_sent_text_containing_to(snippet, user))
            .await
    }

    /// `user` eventually receives a message fully matching `pattern`.
    pub async fn receives_matches(&self, user: &User, pattern: &TextPattern) -> Result<()> {
        self.eventually(format!(
            "Verify Fibi sent message matching '{pattern}' to '{}'",
            user.name
        ))
        .until(|| self.client.verify_sent_text_like_to(pattern, user))
        .await
    }

    /// `user` eventually receives anything at all.
    pub async fn receives_any(&self, user: &User) -> Result<()> {
        self.eventually(format!("Verify Fibi sent anything to '{}'", user.name))
            .until(|| self.client.verify_sent_to(&user.name))
            .await
    }

    /// `user` eventually has unread messages, none of which contain
    /// `snippet`. Nothing is marked processed.
    pub async fn receives_not_containing(&self, user: &User, snippet: &str) -> Result<()> {
        let snippet = snippet.to_lowercase();
        self.eventually(format!("Verify Fibi did not send '{snippet}' to '{}'", user.name))
            .until(|| {
                let messages = self.unprocessed(user);
                !messages.is_empty()
                    && messages
                        .iter()
                        .all(|m| !m.text.to_lowercase().contains(&snippet))
            })
            .await
    }

    /// After `within`, no unread message to `user` equals `text`
    /// (case-insensitive). Nothing is marked processed.
    pub async fn does_not_receive(&self, user: &User, text: &str, within: Duration) -> Result<()> {
        debug!(target: "hf.verify", user = %user.name, ?within, "watching for an unwanted message");
        tokio::time::sleep(within).await;
        let expected = text.to_lowercase();
        let offending = self
            .unprocessed(user)
            .into_iter()
            .find(|m| m.text.to_lowercase() == expected);
        match offending {
            None => Ok(()),
            Some(m) => Err(HarnessError::assertion(format!(
                "Verify Fibi did NOT send '{text}' to '{}'",
                user.name
            ))
            .with_context("received_at", m.received_at.to_rfc3339())),
        }
    }

    /// The assistant eventually acknowledges message `id` from `user`.
    pub async fn message_confirmed(&self, user: &User, id: MessageId) -> Result<()> {
        self.eventually(format!("Verify Fibi received message {id} from '{}'", user.name))
            .until(|| self.client.verify_confirmed_message(user, id))
            .await
    }

    // -- Waits --------------------------------------------------------------

    /// Wait `duration` of wall-clock time, then drop everything the user
    /// received meanwhile.
    pub async fn pass_time(&self, user: &User, duration: Duration) -> Result<()> {
        crate::poll::wait_for(duration).await?;
        let dropped = self.client.clear_messages_for(&user.name);
        debug!(target: "hf.verify", user = %user.name, dropped, "time passed");
        Ok(())
    }

    /// Sleep until shortly before `at`, then mark the user's messages read
    /// so that only what the assistant sends at `at` is observed.
    ///
    /// Wakes `guard_before` ahead of `at` (immediately if that is already
    /// past), within a window that closes `guard_after` after `at`.
    pub async fn virtual_wait_until(&self, user: &User, at: DateTime<Utc>) -> Result<()> {
        let ahead = (at - Utc::now()).to_std().unwrap_or_default();
        let delay = ahead.saturating_sub(self.timeouts.guard_before());
        info!(
            target: "hf.verify",
            user = %user.name,
            %at,
            delay_ms = delay.as_millis() as u64,
            "waiting for a scheduled instant"
        );
        Await::new()
            .alias(format!("waiting until {at}"))
            .poll_delay(delay)
            .at_most(ahead + self.timeouts.guard_after())
            .until(|| true)
            .await?;
        self.client.mark_messages_read(&user.name);
        Ok(())
    }

    /// Virtual wait until the instant of the user's reminder.
    pub async fn wait_for_reminder(&self, user: &User) -> Result<()> {
        let reminder = self.reminders.last_added_of(&user.name)?;
        self.virtual_wait_until(user, reminder.remind_at).await
    }

    /// Virtual wait until the newest appointment of the user ends.
    pub async fn wait_for_appointment_end(&self, user: &User) -> Result<()> {
        let appointment = self
            .appointments
            .all(&user.name)
            .into_iter()
            .next()
            .ok_or_else(|| {
                HarnessError::lookup(format!("'{}' has no appointments", user.name))
            })?;
        self.virtual_wait_until(user, appointment.end_at).await
    }

    // -- Confirmations ------------------------------------------------------

    /// Two-phase confirmation: await the confirmation itself (answering a
    /// clarifying question on the way if one arrives), record what it
    /// confirms, then await the assistant's follow-up.
    pub async fn await_confirmation(&self, user: &User, kind: Confirmation) -> Result<()> {
        self.eventually(format!("Verify Fibi sent {} to '{}'", kind.describe(), user.name))
            .until_async(|| self.poll_confirmation(user, kind))
            .await?;
        self.client.mark_messages_read(&user.name);
        self.await_follow_up(user).await
    }

    async fn poll_confirmation(&self, user: &User, kind: Confirmation) -> Result<bool> {
        let messages = self.unprocessed(user);
        for message in &messages {
            if let Some(caps) = kind.captures(&message.text) {
                self.record(user, kind, &caps)?;
                return Ok(true);
            }
        }
        if let Some(check_up) = kind.check_up()
            && messages.iter().any(|m| check_up.is_asked_by(&m.text))
        {
            info!(target: "hf.verify", user = %user.name, answer = check_up.answer, "answering check-up question");
            self.client.mark_messages_read(&user.name);
            self.client
                .send_message_to_assistant(user, check_up.answer)
                .await?;
        }
        Ok(false)
    }

    fn record(&self, user: &User, kind: Confirmation, caps: &regex::Captures<'_>) -> Result<()> {
        let name = user.name.as_str();
        match kind {
            Confirmation::TaskAdded => self.tasks.add(Task::open(name, &caps["title"])),
            Confirmation::TaskCompleted => {
                self.tasks.mark_complete(name, &caps["title"]);
            }
            Confirmation::TaskRenamed => self.tasks.rename(name, &caps["title"], &caps["oldTitle"]),
            Confirmation::ReminderSet => {
                let remind_at = parse_reminder_instant(&caps["formattedDateTime"])?;
                self.reminders.add(Reminder {
                    username: name.to_string(),
                    remind_at,
                });
            }
            Confirmation::TimerAdded => {}
        }
        debug!(target: "hf.verify", user = name, confirmation = kind.describe(), "recorded");
        Ok(())
    }

    async fn await_follow_up(&self, user: &User) -> Result<()> {
        self.eventually(format!("Verify Fibi followed up with '{}'", user.name))
            .until(|| !self.unprocessed(user).is_empty())
            .await?;
        self.client.mark_messages_read(&user.name);
        Ok(())
    }

    // -- Lists --------------------------------------------------------------

    /// Some unread message mentions every active task of the user.
    pub async fn receives_task_list(&self, user: &User) -> Result<()> {
        let titles: Vec<String> = self
            .tasks
            .active_tasks(&user.name)
            .into_iter()
            .map(|t| t.title)
            .collect();
        self.receives_mentions_of(user, "list of the tasks", titles, None)
            .await
    }

    /// Some unread message mentions every appointment the user has today.
    pub async fn receives_appointment_list(&self, user: &User) -> Result<()> {
        self.receives_mentions_of(user, "list of appointments", self.appointment_titles(user), None)
            .await
    }

    /// A single unread message fully matches `pattern` and mentions every
    /// appointment the user has today.
    pub async fn receives_appointment_list_matching(
        &self,
        user: &User,
        pattern: &TextPattern,
    ) -> Result<()> {
        let what = format!("message matching '{pattern}' listing all appointments");
        self.receives_mentions_of(user, &what, self.appointment_titles(user), Some(pattern))
            .await
    }

    /// Titles of appointments starting or ending on the current UTC day.
    fn appointment_titles(&self, user: &User) -> Vec<String> {
        self.appointments
            .on_day(&user.name, Utc::now().date_naive())
            .into_iter()
            .map(|a| a.title)
            .collect()
    }

    async fn receives_mentions_of(
        &self,
        user: &User,
        what: &str,
        titles: Vec<String>,
        pattern: Option<&TextPattern>,
    ) -> Result<()> {
        let titles: Vec<String> = titles.into_iter().map(|t| t.to_lowercase()).collect();
        self.eventually(format!("Verify Fibi sent a {what} to '{}'", user.name))
            .until(|| {
                self.unprocessed(user).iter().any(|m| {
                    let text = m.text.to_lowercase();
                    pattern.is_none_or(|p| p.is_full_match(&m.text))
                        && titles.iter().all(|t| text.contains(t))
                })
            })
            .await?;
        self.client.mark_messages_read(&user.name);
        Ok(())
    }

    /// Single-phase: some unread message contains "cleaned up tasks".
    pub async fn receives_cleaned_up_tasks(&self, user: &User) -> Result<()> {
        self.receives_unread_containing(user, "cleaned up tasks").await
    }

    /// Two-phase: some unread message contains "cleaned up", then a
    /// follow-up arrives.
    pub async fn receives_tasks_cleaned_up(&self, user: &User) -> Result<()> {
        self.receives_unread_containing(user, "cleaned up").await?;
        self.await_follow_up(user).await
    }

    async fn receives_unread_containing(&self, user: &User, snippet: &str) -> Result<()> {
        self.eventually(format!("Verify Fibi sent '{snippet}' to '{}'", user.name))
            .until(|| {
                self.unprocessed(user)
                    .iter()
                    .any(|m| m.text.to_lowercase().contains(snippet))
            })
            .await?;
        self.client.mark_messages_read(&user.name);
        Ok(())
    }
}
