// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the HelloFibi harness.
//!
//! [`HarnessConfig`] holds the messenger base URL (the single required
//! property, `signal-mock.base-url`), the optional CalDAV endpoints and the
//! timing knobs of the verification engine. It is read from TOML, then
//! overridden from the environment, then validated into advisory
//! [`ConfigWarning`]s or a hard [`ConfigError`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

use hf_error::{ErrorKind, HarnessError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file (or an environment override) could not be parsed.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },

    /// A property that the caller requires is not set.
    #[error("missing required property '{name}'")]
    MissingProperty {
        /// Dotted property name, e.g. `signal-mock.base-url`.
        name: String,
    },
}

impl From<ConfigError> for HarnessError {
    fn from(err: ConfigError) -> Self {
        HarnessError::new(ErrorKind::Config, err.to_string()).with_source(err)
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A timeout is unusually large.
    LargeTimeout {
        /// Name of the timeout.
        name: String,
        /// Timeout value in seconds.
        secs: u64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeTimeout { name, secs } => {
                write!(f, "timeout '{name}' is unusually large ({secs}s)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level harness configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Log level (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Messenger mock endpoint settings.
    #[serde(rename = "signal-mock", default)]
    pub signal_mock: SignalMockConfig,

    /// CalDAV server used to seed calendars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caldav: Option<CalDavConfig>,

    /// Verification timing.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            signal_mock: SignalMockConfig::default(),
            caldav: None,
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Where the messenger mock lives and how the event stream is consumed.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SignalMockConfig {
    /// Base URL; `/send`, `/react` and `/all_events` are appended to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Pause between event-stream subscriptions after a disconnect.
    #[serde(default = "default_resubscribe_delay_ms")]
    pub resubscribe_delay_ms: u64,
}

impl Default for SignalMockConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            resubscribe_delay_ms: default_resubscribe_delay_ms(),
        }
    }
}

/// CalDAV endpoints.
///
/// The harness and the assistant usually reach the server under different
/// host names, so both are configured.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CalDavConfig {
    /// Root URL as reachable from the harness.
    pub root_url: String,
    /// Root URL as reachable from the assistant. Defaults to `root_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_root_url: Option<String>,
    /// Plain `user:password` file read by the CalDAV server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_file: Option<String>,
}

impl CalDavConfig {
    /// Root URL handed to the assistant.
    pub fn assistant_root(&self) -> &str {
        self.assistant_root_url.as_deref().unwrap_or(&self.root_url)
    }
}

/// Timing knobs for eventual assertions and virtual waits.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TimeoutConfig {
    /// Upper bound for "eventually receive" assertions.
    #[serde(default = "default_assertion_secs")]
    pub assertion_secs: u64,
    /// Pause between predicate evaluations.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long before a future instant a virtual wait wakes up.
    #[serde(default = "default_guard_before_secs")]
    pub guard_before_secs: u64,
    /// How long after a future instant a virtual wait may still run.
    #[serde(default = "default_guard_after_secs")]
    pub guard_after_secs: u64,
    /// Upper bound for the calendar connection confirmation.
    #[serde(default = "default_calendar_connect_secs")]
    pub calendar_connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            assertion_secs: default_assertion_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            guard_before_secs: default_guard_before_secs(),
            guard_after_secs: default_guard_after_secs(),
            calendar_connect_secs: default_calendar_connect_secs(),
        }
    }
}

impl TimeoutConfig {
    /// [`Self::assertion_secs`] as a [`Duration`].
    pub fn assertion(&self) -> Duration {
        Duration::from_secs(self.assertion_secs)
    }

    /// [`Self::poll_interval_ms`] as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// [`Self::guard_before_secs`] as a [`Duration`].
    pub fn guard_before(&self) -> Duration {
        Duration::from_secs(self.guard_before_secs)
    }

    /// [`Self::guard_after_secs`] as a [`Duration`].
    pub fn guard_after(&self) -> Duration {
        Duration::from_secs(self.guard_after_secs)
    }

    /// [`Self::calendar_connect_secs`] as a [`Duration`].
    pub fn calendar_connect(&self) -> Duration {
        Duration::from_secs(self.calendar_connect_secs)
    }
}

fn default_resubscribe_delay_ms() -> u64 {
    100
}
fn default_assertion_secs() -> u64 {
    120
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_guard_before_secs() -> u64 {
    5
}
fn default_guard_after_secs() -> u64 {
    10
}
fn default_calendar_connect_secs() -> u64 {
    60
}

impl HarnessConfig {
    /// The messenger base URL, or [`ConfigError::MissingProperty`].
    pub fn require_base_url(&self) -> Result<&str, ConfigError> {
        self.signal_mock
            .base_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingProperty {
                name: "signal-mock.base-url".into(),
            })
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed timeout in seconds (24 hours).
const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Threshold above which a timeout generates a warning.
const LARGE_TIMEOUT_THRESHOLD: u64 = 3_600;

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "HF_CONFIG";

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`HarnessConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, starts from [`HarnessConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => HarnessConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load using the path in `HF_CONFIG`, if set.
pub fn load_from_env() -> Result<HarnessConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).ok();
    load_config(path.as_deref().map(Path::new))
}

/// Parse a TOML string into a [`HarnessConfig`].
pub fn parse_toml(content: &str) -> Result<HarnessConfig, ConfigError> {
    toml::from_str::<HarnessConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

/// JSON schema describing the TOML layout.
pub fn config_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(HarnessConfig)).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides from the process environment.
///
/// Recognised variables:
/// - `SIGNAL_MOCK_BASE_URL`
/// - `HF_LOG_LEVEL`
/// - `HF_CALDAV_ROOT_URL`
/// - `HF_CALDAV_ASSISTANT_ROOT_URL`
/// - `HF_CALDAV_USERS_FILE`
/// - `HF_ASSERTION_TIMEOUT_SECS`
pub fn apply_env_overrides(config: &mut HarnessConfig) -> Result<(), ConfigError> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary key lookup.
pub fn apply_overrides_from(
    config: &mut HarnessConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(val) = lookup("SIGNAL_MOCK_BASE_URL") {
        config.signal_mock.base_url = Some(val);
    }
    if let Some(val) = lookup("HF_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Some(val) = lookup("HF_CALDAV_ROOT_URL") {
        match config.caldav.as_mut() {
            Some(caldav) => caldav.root_url = val,
            None => {
                config.caldav = Some(CalDavConfig {
                    root_url: val,
                    assistant_root_url: None,
                    users_file: None,
                })
            }
        }
    }
    if let Some(val) = lookup("HF_CALDAV_ASSISTANT_ROOT_URL")
        && let Some(caldav) = config.caldav.as_mut()
    {
        caldav.assistant_root_url = Some(val);
    }
    if let Some(val) = lookup("HF_CALDAV_USERS_FILE")
        && let Some(caldav) = config.caldav.as_mut()
    {
        caldav.users_file = Some(val);
    }
    if let Some(val) = lookup("HF_ASSERTION_TIMEOUT_SECS") {
        config.timeouts.assertion_secs =
            val.trim().parse().map_err(|_| ConfigError::ParseError {
                reason: format!("HF_ASSERTION_TIMEOUT_SECS is not a number: '{val}'"),
            })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    matches!(rest, Some(r) if !r.is_empty() && !r.starts_with('/'))
}

/// Validate a parsed configuration, returning advisory warnings.
///
/// Malformed URLs, unknown log levels and out-of-range timeouts are hard
/// errors; soft issues come back as warnings.
pub fn validate_config(config: &HarnessConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    match config.signal_mock.base_url {
        Some(ref url) if !is_http_url(url) => {
            errors.push(format!("signal-mock.base-url '{url}' is not an http(s) URL"));
        }
        Some(_) => {}
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "signal-mock.base-url".into(),
            hint: "the in-process mock messenger will be used".into(),
        }),
    }

    match config.caldav {
        Some(ref caldav) => {
            if !is_http_url(&caldav.root_url) {
                errors.push(format!(
                    "caldav.root-url '{}' is not an http(s) URL",
                    caldav.root_url
                ));
            }
            if let Some(ref url) = caldav.assistant_root_url
                && !is_http_url(url)
            {
                errors.push(format!(
                    "caldav.assistant-root-url '{url}' is not an http(s) URL"
                ));
            }
        }
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "caldav".into(),
            hint: "calendar scenarios cannot seed appointments".into(),
        }),
    }

    let t = &config.timeouts;
    for (name, secs) in [
        ("assertion-secs", t.assertion_secs),
        ("calendar-connect-secs", t.calendar_connect_secs),
    ] {
        if secs == 0 || secs > MAX_TIMEOUT_SECS {
            errors.push(format!(
                "timeouts.{name}: {secs}s out of range (1..{MAX_TIMEOUT_SECS})"
            ));
        } else if secs > LARGE_TIMEOUT_THRESHOLD {
            warnings.push(ConfigWarning::LargeTimeout {
                name: name.into(),
                secs,
            });
        }
    }
    if t.poll_interval_ms == 0 {
        errors.push("timeouts.poll-interval-ms must be positive".into());
    }
    if t.guard_after_secs == 0 {
        errors.push("timeouts.guard-after-secs must be positive".into());
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over `base`.
///
/// Timeouts are taken from the overlay as a whole.
pub fn merge_configs(base: HarnessConfig, overlay: HarnessConfig) -> HarnessConfig {
    HarnessConfig {
        log_level: overlay.log_level.or(base.log_level),
        signal_mock: SignalMockConfig {
            base_url: overlay.signal_mock.base_url.or(base.signal_mock.base_url),
            resubscribe_delay_ms: overlay.signal_mock.resubscribe_delay_ms,
        },
        caldav: overlay.caldav.or(base.caldav),
        timeouts: overlay.timeouts,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
