// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide wiring of stores, messenger, verifier and calendar client.

use hf_caldav::CalDavClient;
use hf_config::{HarnessConfig, TimeoutConfig};
use hf_error::{HarnessError, Result};
use hf_inbox::{Inbox, Receipts};
use hf_messenger::{Ingestor, IngestorHandle, MessengerClient, RetryConfig, probe_messenger};
use hf_mock_messenger::{FibiScript, Responder, RunningMock};
use hf_store::{AppointmentStore, ReminderStore, TaskStore, UserRegistry};
use hf_verify::Verifier;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a suite shares across scenarios.
///
/// Created once before the first scenario. When no messenger base URL is
/// configured an in-process mock driven by a [`Responder`] stands in for
/// the real one ("offline mode").
pub struct Harness {
    config: HarnessConfig,
    base_url: String,
    registry: UserRegistry,
    tasks: TaskStore,
    reminders: ReminderStore,
    appointments: AppointmentStore,
    verifier: Verifier,
    caldav: Option<CalDavClient>,
    ingestor: IngestorHandle,
    mock: Option<RunningMock>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("base_url", &self.base_url)
            .field("offline", &self.is_offline())
            .field("caldav", &self.caldav.is_some())
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Wire up the suite; offline mode uses [`FibiScript`].
    pub async fn start(config: HarnessConfig) -> Result<Self> {
        Self::start_with(config, Arc::new(FibiScript::new())).await
    }

    /// Wire up the suite; offline mode answers through `responder`.
    pub async fn start_with(config: HarnessConfig, responder: Arc<dyn Responder>) -> Result<Self> {
        let (base_url, mock) = match config.signal_mock.base_url.clone() {
            Some(url) => (url, None),
            None => {
                let mock = RunningMock::start(responder).await.map_err(|e| {
                    HarnessError::setup("failed to start the in-process messenger mock").with_source(e)
                })?;
                warn!(
                    target: "hf.steps",
                    base_url = mock.base_url(),
                    "signal-mock.base-url not set, running against the in-process mock"
                );
                (mock.base_url().to_string(), Some(mock))
            }
        };

        let probe = probe_messenger(&base_url, &RetryConfig::default()).await?;
        info!(target: "hf.steps", %base_url, attempts = probe.attempts, "messenger reachable");

        let registry = UserRegistry::new();
        let inbox = Inbox::new();
        let receipts = Receipts::new();
        let ingestor = Ingestor::new(&base_url, registry.clone(), inbox.clone(), receipts.clone())
            .with_resubscribe_delay(Duration::from_millis(config.signal_mock.resubscribe_delay_ms))
            .spawn();
        ingestor.wait_for_subscription(1, SUBSCRIBE_TIMEOUT).await?;

        let tasks = TaskStore::new();
        let reminders = ReminderStore::new();
        let appointments = AppointmentStore::new();
        let client = MessengerClient::new(&base_url, registry.clone(), inbox, receipts);
        let verifier = Verifier::new(
            client,
            tasks.clone(),
            reminders.clone(),
            appointments.clone(),
            config.timeouts.clone(),
        );
        let caldav = config.caldav.as_ref().map(CalDavClient::new);

        Ok(Self {
            config,
            base_url,
            registry,
            tasks,
            reminders,
            appointments,
            verifier,
            caldav,
            ingestor,
            mock,
        })
    }

    /// Configuration in effect.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Timing in effect.
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.config.timeouts
    }

    /// Messenger base URL in use, configured or in-process.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the in-process mock is standing in for the messenger.
    pub fn is_offline(&self) -> bool {
        self.mock.is_some()
    }

    /// The in-process mock, in offline mode.
    pub fn mock(&self) -> Option<&RunningMock> {
        self.mock.as_ref()
    }

    /// Simulated users.
    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    /// Tasks the assistant confirmed.
    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Reminders the assistant confirmed.
    pub fn reminders(&self) -> &ReminderStore {
        &self.reminders
    }

    /// Appointments seeded into calendars.
    pub fn appointments(&self) -> &AppointmentStore {
        &self.appointments
    }

    /// Assertions over the inbox.
    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// Messenger client.
    pub fn client(&self) -> &MessengerClient {
        self.verifier.client()
    }

    /// Calendar client, or a setup error when no CalDAV server is configured.
    pub fn caldav(&self) -> Result<&CalDavClient> {
        self.caldav
            .as_ref()
            .ok_or_else(|| HarnessError::setup("no [caldav] section configured"))
    }

    /// Stop the ingestor and the in-process mock.
    pub async fn shutdown(self) {
        self.ingestor.shutdown().await;
        if let Some(mock) = self.mock {
            mock.shutdown().await;
        }
        info!(target: "hf.steps", "harness stopped");
    }
}
