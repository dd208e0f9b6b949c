// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of simulated users, keyed by display name.

use crate::StoreError;
use crate::names::NAMES;
use chrono::NaiveTime;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Display name of the assistant under test.
pub const ASSISTANT_NAME: &str = "Fibi";
/// Phone number the assistant is registered under.
pub const ASSISTANT_NUMBER: &str = "+1337";
/// Every simulated participant uses the same device.
pub const DEVICE_ID: u16 = 1;

/// A simulated messenger participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name; also the registry key.
    pub name: String,
    /// Phone number, e.g. `+4917123`.
    pub number: String,
    /// Messenger account UUID.
    pub uuid: String,
    /// Device id (always [`DEVICE_ID`]).
    pub device_id: u16,
    /// Calendar URL as seen by the assistant.
    pub caldav_url: Option<String>,
    /// Calendar user name.
    pub caldav_user: Option<String>,
    /// Calendar password.
    pub caldav_password: Option<String>,
    /// Local wake-up time announced to the assistant.
    pub wake_up_time: Option<NaiveTime>,
}

impl User {
    /// A user without calendar or wake-up settings.
    pub fn new(name: impl Into<String>, number: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            uuid: uuid.into(),
            device_id: DEVICE_ID,
            caldav_url: None,
            caldav_user: None,
            caldav_password: None,
            wake_up_time: None,
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    users: HashMap<String, User>,
    current: Option<String>,
}

/// Shared registry of users plus the scenario's current user.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone)]
pub struct UserRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRegistry {
    /// A registry holding only the assistant.
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(
            ASSISTANT_NAME.to_string(),
            User::new(ASSISTANT_NAME, ASSISTANT_NUMBER, Uuid::new_v4().to_string()),
        );
        Self {
            inner: Arc::new(RwLock::new(Registry {
                users,
                current: None,
            })),
        }
    }

    /// The assistant's record.
    pub fn assistant(&self) -> User {
        self.read()
            .users
            .get(ASSISTANT_NAME)
            .cloned()
            .unwrap_or_else(|| User::new(ASSISTANT_NAME, ASSISTANT_NUMBER, Uuid::nil().to_string()))
    }

    /// Register a user with a random unused name and make it current.
    pub fn new_user(&self) -> User {
        let mut rng = rand::thread_rng();
        let name = {
            let reg = self.read();
            let free: Vec<&&str> = NAMES
                .iter()
                .filter(|n| !reg.users.contains_key(**n))
                .collect();
            match free.choose(&mut rng) {
                Some(n) => n.to_string(),
                // Pool exhausted: disambiguate with a suffix.
                None => {
                    let base = NAMES.choose(&mut rng).copied().unwrap_or("User");
                    let mut suffix = 2;
                    while reg.users.contains_key(&format!("{base}{suffix}")) {
                        suffix += 1;
                    }
                    format!("{base}{suffix}")
                }
            }
        };
        self.new_user_named(name)
    }

    /// Register a user under `name` with a random number and UUID and make it
    /// current. An existing user of that name is replaced.
    pub fn new_user_named(&self, name: impl Into<String>) -> User {
        let name = name.into();
        let number = format!("+{}", rand::thread_rng().gen_range(99_999_i64..99_999_999));
        let user = User::new(name.clone(), number, Uuid::new_v4().to_string());
        debug!(target: "hf.store", user = %user.name, number = %user.number, "registered user");
        let mut reg = self.write();
        reg.users.insert(name.clone(), user.clone());
        reg.current = Some(name);
        user
    }

    /// Insert or replace a fully specified user without changing the current one.
    pub fn register(&self, user: User) {
        self.write().users.insert(user.name.clone(), user);
    }

    /// Look up by exact display name.
    pub fn user_by_name(&self, name: &str) -> Option<User> {
        self.read().users.get(name).cloned()
    }

    /// Look up by exact UUID.
    pub fn user_by_uuid(&self, uuid: &str) -> Option<User> {
        self.read().users.values().find(|u| u.uuid == uuid).cloned()
    }

    /// Look up a user whose number *contains* `number`.
    ///
    /// Containment, not equality: `+12` resolves to a user numbered `+1234`.
    /// When several users match, which one is returned is unspecified.
    pub fn user_by_number(&self, number: &str) -> Result<User, StoreError> {
        self.read()
            .users
            .values()
            .find(|u| u.number.contains(number))
            .cloned()
            .ok_or_else(|| StoreError::UnknownNumber {
                number: number.to_string(),
            })
    }

    /// Make `name` the current user. Unknown names are ignored.
    pub fn set_current_user(&self, name: &str) {
        let mut reg = self.write();
        if reg.users.contains_key(name) {
            reg.current = Some(name.to_string());
        }
    }

    /// The scenario's current user.
    pub fn current_user(&self) -> Result<User, StoreError> {
        let reg = self.read();
        reg.current
            .as_ref()
            .and_then(|name| reg.users.get(name))
            .cloned()
            .ok_or(StoreError::NoCurrentUser)
    }

    /// Record calendar access for `name`.
    pub fn save_caldav_info(
        &self,
        name: &str,
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<User, StoreError> {
        self.replace(name, |u| User {
            caldav_url: Some(url.into()),
            caldav_user: Some(user.into()),
            caldav_password: Some(password.into()),
            ..u
        })
    }

    /// Record the wake-up time announced by `name`.
    pub fn save_wake_up_time(&self, name: &str, time: NaiveTime) -> Result<User, StoreError> {
        self.replace(name, |u| User {
            wake_up_time: Some(time),
            ..u
        })
    }

    fn replace(&self, name: &str, f: impl FnOnce(User) -> User) -> Result<User, StoreError> {
        let mut reg = self.write();
        let current = reg
            .users
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownUser {
                name: name.to_string(),
            })?;
        let updated = f(current);
        reg.users.insert(name.to_string(), updated.clone());
        Ok(updated)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.inner.read().expect("user registry lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        self.inner.write().expect("user registry lock poisoned")
    }
}
