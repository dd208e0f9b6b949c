// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP side: user provisioning, calendar creation and event seeding.

use crate::ical::{insert_event, render_calendar, render_event};
use chrono::Utc;
use hf_config::CalDavConfig;
use hf_error::{HarnessError, Result};
use hf_store::Appointment;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Basic-auth credentials of one calendar owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Credentials derived from a display name: `ann` / `ann123`.
pub fn credentials_for(name: &str) -> Credentials {
    let username = name.to_lowercase();
    let password = format!("{username}123");
    Credentials { username, password }
}

/// `user:password` lines for every provisioned user, joined by `\n`.
pub fn users_file<'a>(users: impl IntoIterator<Item = &'a str>) -> String {
    users
        .into_iter()
        .map(|u| {
            let c = credentials_for(u);
            format!("{}:{}", c.username, c.password)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A calendar as the assistant should be told about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarAccess {
    /// Calendar URL under the assistant-facing root, with trailing slash.
    pub url: String,
    /// Owner credentials.
    pub credentials: Credentials,
}

/// Seeds calendars on a CalDAV server.
#[derive(Debug, Clone)]
pub struct CalDavClient {
    http: reqwest::Client,
    root_url: String,
    assistant_root_url: String,
    users_file: Option<PathBuf>,
    users: Arc<Mutex<BTreeSet<String>>>,
}

impl CalDavClient {
    /// A client for the server described by `config`.
    pub fn new(config: &CalDavConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            root_url: config.root_url.trim_end_matches('/').to_string(),
            assistant_root_url: config.assistant_root().trim_end_matches('/').to_string(),
            users_file: config.users_file.as_ref().map(PathBuf::from),
            users: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// `<root>/<lower(name)>/calendar/` as seen from the harness.
    pub fn calendar_url(&self, name: &str) -> String {
        format!("{}/{}/calendar/", self.root_url, name.to_lowercase())
    }

    /// The same calendar as seen from the assistant.
    pub fn assistant_calendar_url(&self, name: &str) -> String {
        format!("{}/{}/calendar/", self.assistant_root_url, name.to_lowercase())
    }

    /// Register `name` as a CalDAV user and rewrite the users file, if one
    /// is configured.
    pub async fn provision_user(&self, name: &str) -> Result<()> {
        let contents = {
            let mut users = self.users.lock().expect("caldav users lock poisoned");
            users.insert(name.to_lowercase());
            users_file(users.iter().map(String::as_str))
        };
        let Some(path) = &self.users_file else {
            debug!(target: "hf.caldav", user = name, "no users file configured");
            return Ok(());
        };
        tokio::fs::write(path, contents).await.map_err(|e| {
            HarnessError::setup("failed to write CalDAV users file")
                .with_context("path", path.display().to_string())
                .with_source(e)
        })?;
        info!(target: "hf.caldav", user = name, path = %path.display(), "users file updated");
        Ok(())
    }

    /// Provision `name` and create an empty private calendar for them.
    pub async fn create_calendar(&self, name: &str) -> Result<CalendarAccess> {
        self.provision_user(name).await?;
        let credentials = credentials_for(name);
        let url = format!("{}/{}/calendar", self.root_url, credentials.username);
        let resp = self
            .http
            .put(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header(reqwest::header::CONTENT_TYPE, "text/calendar; charset=utf-8")
            .body(render_calendar(name))
            .send()
            .await
            .map_err(|e| {
                HarnessError::setup(format!("failed to create calendar for user {name}"))
                    .with_context("url", &url)
                    .with_source(e)
            })?;
        check(resp.status(), "create calendar", &url)?;
        info!(target: "hf.caldav", user = name, %url, "calendar created");
        Ok(CalendarAccess {
            url: self.assistant_calendar_url(name),
            credentials,
        })
    }

    /// Append `appointment` to `name`'s calendar.
    pub async fn add_event(&self, name: &str, appointment: &Appointment) -> Result<()> {
        let credentials = credentials_for(name);
        let url = self.calendar_url(name);
        let setup_err = |e: reqwest::Error| {
            HarnessError::setup(format!("failed to create appointment: {}", appointment.title))
                .with_context("url", &url)
                .with_source(e)
        };

        let resp = self
            .http
            .get(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(setup_err)?;
        check(resp.status(), "fetch calendar", &url)?;
        let calendar = resp.text().await.map_err(setup_err)?;

        let uid = uuid::Uuid::new_v4().to_string();
        let merged = insert_event(&calendar, &render_event(appointment, &uid, Utc::now()))?;
        let resp = self
            .http
            .put(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header(reqwest::header::CONTENT_TYPE, "text/calendar; charset=utf-8")
            .body(merged)
            .send()
            .await
            .map_err(setup_err)?;
        check(resp.status(), "store calendar", &url)?;
        info!(
            target: "hf.caldav",
            user = name,
            title = %appointment.title,
            start = %appointment.start_at,
            end = %appointment.end_at,
            "created appointment"
        );
        Ok(())
    }
}

fn check(status: reqwest::StatusCode, what: &str, url: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(HarnessError::setup(format!("{what} returned {status}")).with_context("url", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_lowercase_with_suffix() {
        assert_eq!(
            credentials_for("Ann"),
            Credentials {
                username: "ann".into(),
                password: "ann123".into()
            }
        );
    }

    #[test]
    fn users_file_lines() {
        assert_eq!(users_file(["ann", "Bob"]), "ann:ann123\nbob:bob123");
        assert_eq!(users_file([]), "");
    }

    #[test]
    fn urls_use_both_roots() {
        let client = CalDavClient::new(&CalDavConfig {
            root_url: "http://localhost:5232/".into(),
            assistant_root_url: Some("http://radicalecalendar:5232".into()),
            users_file: None,
        });
        assert_eq!(client.calendar_url("Ann"), "http://localhost:5232/ann/calendar/");
        assert_eq!(
            client.assistant_calendar_url("Ann"),
            "http://radicalecalendar:5232/ann/calendar/"
        );
    }
}
