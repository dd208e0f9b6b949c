// SPDX-License-Identifier: MIT OR Apache-2.0
//! One method per English step phrase.
//!
//! Every step acts on the registry's current user, so scenarios must run one
//! at a time.

use crate::harness::Harness;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, Timelike, Utc};
use hf_error::{HarnessError, Result};
use hf_inbox::MessageId;
use hf_store::{Appointment, User};
use hf_verify::{Confirmation, PredefinedPattern, PredefinedText};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Step state of one scenario over the shared [`Harness`].
#[derive(Debug, Clone)]
pub struct Conversation {
    harness: Arc<Harness>,
    last_sent: Option<MessageId>,
}

impl Conversation {
    /// A fresh scenario.
    pub fn new(harness: Arc<Harness>) -> Self {
        Self {
            harness,
            last_sent: None,
        }
    }

    /// The shared harness.
    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// The scenario's current user, as stored right now.
    pub fn current(&self) -> Result<User> {
        Ok(self.harness.registry().current_user()?)
    }

    // -- Users --------------------------------------------------------------

    /// `Given a user who is new`
    pub fn a_new_user(&self) -> User {
        let user = self.harness.registry().new_user();
        info!(target: "hf.steps", user = %user.name, number = %user.number, "new user");
        user
    }

    /// `Given a new user named "<N>"`
    pub fn a_new_user_named(&self, name: &str) -> User {
        let user = self.harness.registry().new_user_named(name);
        info!(target: "hf.steps", user = %user.name, number = %user.number, "new user");
        user
    }

    /// `Given a Friend`: a new user who has already given consent.
    pub async fn a_friend(&mut self) -> Result<User> {
        let user = self.a_new_user();
        self.befriend(user).await
    }

    /// `Given a Friend named "<N>"`
    pub async fn a_friend_named(&mut self, name: &str) -> Result<User> {
        let user = self.a_new_user_named(name);
        self.befriend(user).await
    }

    async fn befriend(&mut self, user: User) -> Result<User> {
        let harness = Arc::clone(&self.harness);
        let verifier = harness.verifier();
        self.send("Hello").await?;
        verifier.receives_any(&user).await?;
        self.send("Yes").await?;
        verifier
            .receives_exact(&user, PredefinedText::Confirmation.text())
            .await?;
        let dropped = harness.client().clear_messages_for(&user.name);
        debug!(target: "hf.steps", user = %user.name, dropped, "onboarded");
        Ok(user)
    }

    // -- Sending ------------------------------------------------------------

    /// `When they send "<T>" to Fibi`
    pub async fn send(&mut self, text: &str) -> Result<MessageId> {
        let user = self.current()?;
        let id = self
            .harness
            .client()
            .send_message_to_assistant(&user, text)
            .await?;
        self.last_sent = Some(id);
        Ok(id)
    }

    /// `When they send a wake-up time N seconds ahead`
    pub async fn send_wake_up_time(&mut self, seconds_ahead: u32) -> Result<()> {
        let user = self.current()?;
        let ahead = Local::now() + ChronoDuration::seconds(i64::from(seconds_ahead));
        let time = ahead.time().with_nanosecond(0).unwrap_or(ahead.time());
        self.harness
            .registry()
            .save_wake_up_time(&user.name, time)?;
        let text = format!("I usually wake-up at around {}", time.format("%-H:%M:%S"));
        self.send(&text).await.map(|_| ())
    }

    /// `When they send their current time`
    pub async fn send_current_time(&mut self) -> Result<()> {
        let text = format!(
            "My current time is {}. Please fix my timezone.",
            Local::now().format("%-H:%M")
        );
        self.send(&text).await.map(|_| ())
    }

    /// `When they react with "<E>" to "<T>"`
    pub async fn react(&self, emoji: &str, text: &str) -> Result<()> {
        let user = self.current()?;
        self.harness
            .client()
            .react_to_message(&user, &user, text, emoji)
            .await
    }

    // -- Time ---------------------------------------------------------------

    /// `When N minutes pass` and friends.
    pub async fn time_passes(&self, duration: Duration) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().pass_time(&user, duration).await
    }

    /// `When the scheduled wake-up time is reached`
    pub async fn wake_up_time_reached(&self) -> Result<()> {
        let user = self.current()?;
        let time = user.wake_up_time.ok_or_else(|| {
            HarnessError::lookup(format!("'{}' never announced a wake-up time", user.name))
        })?;
        let at = next_local_instant(time, Utc::now());
        self.harness.verifier().virtual_wait_until(&user, at).await
    }

    /// `When wait till the reminder time is reached`
    pub async fn reminder_time_reached(&self) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().wait_for_reminder(&user).await
    }

    /// `When the end of the appointment is reached`
    pub async fn appointment_end_reached(&self) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().wait_for_appointment_end(&user).await
    }

    // -- Receiving ----------------------------------------------------------

    /// `Then they eventually receive "<T>"`
    pub async fn receives(&self, text: &str) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().receives_exact(&user, text).await
    }

    /// `Then they eventually receive the <text label>`
    pub async fn receives_text(&self, text: PredefinedText) -> Result<()> {
        self.receives(text.text()).await
    }

    /// `Then they eventually receive a <pattern label>`
    pub async fn receives_pattern(&self, pattern: PredefinedPattern) -> Result<()> {
        let user = self.current()?;
        self.harness
            .verifier()
            .receives_matches(&user, &pattern.pattern())
            .await
    }

    /// `Then they eventually receive any message`
    pub async fn receives_anything(&self) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().receives_any(&user).await
    }

    /// `Then they eventually receive a message containing "<S>"`
    pub async fn receives_containing(&self, snippet: &str) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().receives_contains(&user, snippet).await
    }

    /// `Then they eventually receive a message not containing "<S>"`
    pub async fn receives_not_containing(&self, snippet: &str) -> Result<()> {
        let user = self.current()?;
        self.harness
            .verifier()
            .receives_not_containing(&user, snippet)
            .await
    }

    /// `Then they do not receive "<T>" within N seconds`
    pub async fn does_not_receive(&self, text: &str, within: Duration) -> Result<()> {
        let user = self.current()?;
        self.harness
            .verifier()
            .does_not_receive(&user, text, within)
            .await
    }

    /// `Then their last message is eventually confirmed as received`
    pub async fn last_message_confirmed(&self) -> Result<()> {
        let user = self.current()?;
        let id = self
            .last_sent
            .ok_or_else(|| HarnessError::lookup("no message sent in this scenario"))?;
        self.harness.verifier().message_confirmed(&user, id).await
    }

    // -- Tasks, reminders, timers --------------------------------------------

    /// `Then they eventually receive a <kind> confirmation`
    pub async fn receives_confirmation(&self, kind: Confirmation) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().await_confirmation(&user, kind).await
    }

    /// `Given they add a task "<T>"`
    pub async fn add_task(&mut self, title: &str) -> Result<()> {
        self.send(&format!("Add task: '{title}'")).await?;
        self.receives_confirmation(Confirmation::TaskAdded).await
    }

    /// `Given they tell to mark task "<T>" completed`
    pub async fn mark_task_completed(&mut self, title: &str) -> Result<()> {
        self.send(&format!("Mark task '{title}' as completed"))
            .await?;
        self.receives_confirmation(Confirmation::TaskCompleted)
            .await
    }

    /// `Then their task "<T>" is recorded as open|completed`
    ///
    /// Checks the title the assistant confirmed, not just that some
    /// confirmation arrived.
    pub fn task_is_recorded(&self, title: &str, complete: bool) -> Result<()> {
        let user = self.current()?;
        let tasks = self.harness.tasks().tasks(&user.name);
        match tasks.iter().find(|t| t.title == title) {
            Some(task) if task.complete == complete => Ok(()),
            Some(_) => Err(HarnessError::assertion(format!(
                "task '{title}' of '{}' is {}",
                user.name,
                if complete { "still open" } else { "already completed" }
            ))),
            None => Err(HarnessError::assertion(format!(
                "no task '{title}' recorded for '{}'",
                user.name
            ))
            .with_context(
                "recorded",
                tasks.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            )),
        }
    }

    /// `Then they eventually receive a list of the tasks`
    pub async fn receives_task_list(&self) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().receives_task_list(&user).await
    }

    /// `Then they eventually receive a cleaned-up tasks confirmation`
    pub async fn receives_cleaned_up_tasks(&self) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().receives_cleaned_up_tasks(&user).await
    }

    /// `Then they eventually receive a tasks cleaned up confirmation`
    pub async fn receives_tasks_cleaned_up(&self) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().receives_tasks_cleaned_up(&user).await
    }

    // -- Calendars ----------------------------------------------------------

    /// `Given they have a WebDAV calendar`
    pub async fn has_calendar(&self) -> Result<()> {
        let user = self.current()?;
        self.calendar_for(&user.name).await
    }

    /// `Given "<N>" has a WebDAV calendar`
    pub async fn named_user_has_calendar(&self, name: &str) -> Result<()> {
        self.calendar_for(name).await
    }

    async fn calendar_for(&self, name: &str) -> Result<()> {
        let access = self.harness.caldav()?.create_calendar(name).await?;
        self.harness.registry().save_caldav_info(
            name,
            access.url,
            access.credentials.username,
            access.credentials.password,
        )?;
        Ok(())
    }

    /// `Given they have N appointments today`
    pub async fn appointments_today(&self, count: usize) -> Result<()> {
        let user = self.current()?;
        let caldav = self.harness.caldav()?;
        let now = Utc::now();
        let mut seeded = Vec::with_capacity(count);
        for _ in 0..count {
            let appointment = Appointment::random_today(now);
            caldav.add_event(&user.name, &appointment).await?;
            seeded.push(appointment);
        }
        self.harness.appointments().add_all(&user.name, seeded);
        Ok(())
    }

    /// `Given they have the appointment "<T>" ending in N minutes`
    pub async fn appointment_ending_in(&self, title: &str, minutes: i64) -> Result<()> {
        let user = self.current()?;
        let now = Utc::now();
        let appointment = Appointment {
            title: title.to_string(),
            start_at: now - ChronoDuration::minutes(90),
            end_at: now + ChronoDuration::minutes(minutes),
        };
        self.harness
            .caldav()?
            .add_event(&user.name, &appointment)
            .await?;
        self.harness.appointments().add(&user.name, appointment);
        Ok(())
    }

    /// `Given they have a registered calendar with N appointments`
    pub async fn registered_calendar_with(&mut self, count: usize) -> Result<()> {
        self.has_calendar().await?;
        self.appointments_today(count).await?;
        let text = format!("I want to add my calendar. {}", self.calendar_details()?);
        self.send(&text).await?;
        let user = self.current()?;
        self.harness
            .verifier()
            .receives_contains_within(
                &user,
                "calendar is now connected",
                self.harness.timeouts().calendar_connect(),
            )
            .await
    }

    /// `When they send their CalDAV URL to Fibi`
    pub async fn send_caldav_url(&mut self) -> Result<()> {
        let text = format!("My {}", self.calendar_details()?);
        self.send(&text).await.map(|_| ())
    }

    fn calendar_details(&self) -> Result<String> {
        let user = self.current()?;
        match (&user.caldav_url, &user.caldav_user, &user.caldav_password) {
            (Some(url), Some(name), Some(password)) => Ok(format!(
                "CalDAV URL is: '{url}' Username: '{name}' Password: '{password}'"
            )),
            _ => Err(HarnessError::lookup(format!("'{}' has no calendar", user.name))),
        }
    }

    /// `Then they eventually receive a list of their appointments`
    pub async fn receives_appointment_list(&self) -> Result<()> {
        let user = self.current()?;
        self.harness.verifier().receives_appointment_list(&user).await
    }

    /// `Then they eventually receive a <pattern label> listing their appointments`
    pub async fn receives_pattern_listing_appointments(
        &self,
        pattern: PredefinedPattern,
    ) -> Result<()> {
        let user = self.current()?;
        self.harness
            .verifier()
            .receives_appointment_list_matching(&user, &pattern.pattern())
            .await
    }
}

/// The next instant at which the local wall clock shows `time`, counting
/// anything within the last second as "now".
pub fn next_local_instant(time: NaiveTime, now: DateTime<Utc>) -> DateTime<Utc> {
    let local_now = now.with_timezone(&Local);
    let today = local_now
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or(now);
    if today < now - ChronoDuration::seconds(1) {
        today + ChronoDuration::days(1)
    } else {
        today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_up_later_today_stays_today() {
        let now = Utc::now();
        let time = (now + ChronoDuration::seconds(30)).with_timezone(&Local).time();
        let at = next_local_instant(time, now);
        let diff = (at - now).num_seconds();
        assert!((29..=30).contains(&diff), "diff was {diff}");
    }

    #[test]
    fn wake_up_already_past_rolls_to_tomorrow() {
        let now = Utc::now();
        let time = (now - ChronoDuration::minutes(10)).with_timezone(&Local).time();
        let at = next_local_instant(time, now);
        assert!(at > now);
        assert!(at - now > ChronoDuration::hours(23));
    }
}
