// SPDX-License-Identifier: MIT OR Apache-2.0
//! Appointments seeded into a user's calendar, newest first.

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Titles drawn for generated appointments.
pub const EVENT_TITLES: &[&str] = &[
    "Birthday",
    "Meeting",
    "Grocery Shopping",
    "Doctor Appointment",
    "Gym Session",
    "Project Deadline",
    "Dentist Appointment",
    "Team Meeting",
    "Parent-Teacher Conference",
    "Webinar",
    "Anniversary",
    "Hairdresser Appointment",
    "Business Trip",
    "Assignment Submission",
    "Friends Gathering",
    "Wedding",
    "Vacation Planning",
    "Vet Appointment",
    "Tax Return Submission",
    "Car Inspection",
    "Kids' Birthday Party",
    "Sports Event",
    "Concert",
    "Flight Trip",
    "Seminar",
    "Driving Lesson",
    "Work Shift",
    "Library Book Return",
    "Tutoring Session",
    "Trade Fair Visit",
];

/// A calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Summary shown in the calendar.
    pub title: String,
    /// Start instant.
    pub start_at: DateTime<Utc>,
    /// End instant.
    pub end_at: DateTime<Utc>,
}

impl Appointment {
    /// A random title in a random quarter-hour slot of the current UTC day.
    pub fn random_today(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let title = EVENT_TITLES.choose(&mut rng).copied().unwrap_or("Meeting");
        let start_at = random_quarter_today(&mut rng, now);
        let end_at = loop {
            let candidate = random_quarter_today(&mut rng, now);
            if candidate >= start_at {
                break candidate;
            }
        };
        Self {
            title: title.to_string(),
            start_at,
            end_at,
        }
    }

    /// Whether the appointment starts or ends on the UTC date `day`.
    pub fn falls_on(&self, day: NaiveDate) -> bool {
        self.start_at.date_naive() == day || self.end_at.date_naive() == day
    }
}

fn random_quarter_today(rng: &mut impl Rng, now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = now.duration_trunc(Duration::days(1)).unwrap_or(now);
    let quarters: i64 = rng.gen_range(0..24 * 4);
    midnight + Duration::minutes(quarters * 15)
}

/// Shared per-user appointment lists.
#[derive(Debug, Clone, Default)]
pub struct AppointmentStore {
    by_user: Arc<Mutex<HashMap<String, Vec<Appointment>>>>,
}

impl AppointmentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend so that the newest appointment comes first.
    pub fn add(&self, username: &str, appointment: Appointment) {
        self.lock()
            .entry(username.to_string())
            .or_default()
            .insert(0, appointment);
    }

    /// Prepend each appointment in turn.
    pub fn add_all(&self, username: &str, appointments: impl IntoIterator<Item = Appointment>) {
        for a in appointments {
            self.add(username, a);
        }
    }

    /// All appointments of `username`, newest first.
    pub fn all(&self, username: &str) -> Vec<Appointment> {
        self.lock().get(username).cloned().unwrap_or_default()
    }

    /// Appointments of `username` that fall on `day`, newest first.
    pub fn on_day(&self, username: &str, day: NaiveDate) -> Vec<Appointment> {
        self.lock()
            .get(username)
            .map(|all| all.iter().filter(|a| a.falls_on(day)).cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Appointment>>> {
        self.by_user.lock().expect("appointment store lock poisoned")
    }
}
