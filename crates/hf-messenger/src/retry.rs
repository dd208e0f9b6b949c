// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded retry with exponential backoff for suite preparation.
//!
//! Only setup work is retried this way (waiting for the messenger to come
//! up). The event stream itself re-subscribes without bound, and
//! assertions never retry.

use hf_error::{ErrorKind, HarnessError};
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Backoff settings.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt. `0` means a single attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Cap on a single delay.
    pub max_delay: Duration,
    /// Wall-clock budget across all attempts.
    pub overall_timeout: Duration,
    /// Jitter factor in `[0.0, 1.0]`. 0 = none, 1 = up to the full delay.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            overall_timeout: Duration::from_secs(60),
            jitter_factor: 0.5,
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// The successful value.
    pub value: T,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// Error messages of the failed attempts.
    pub failures: Vec<String>,
}

/// Backoff delay before retry number `attempt` (zero-indexed).
pub fn compute_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = 2u64.saturating_pow(attempt);
    let delay_ms = (config.base_delay.as_millis() as u64).saturating_mul(exp);
    let capped_ms = delay_ms.min(config.max_delay.as_millis() as u64);

    let jitter_factor = config.jitter_factor.clamp(0.0, 1.0);
    let jitter_range = (capped_ms as f64 * jitter_factor) as u64;
    if jitter_range == 0 {
        return Duration::from_millis(capped_ms);
    }
    let jitter = rand::thread_rng().gen_range(0..jitter_range);
    Duration::from_millis(capped_ms.saturating_sub(jitter))
}

/// Transport and setup failures are worth another attempt.
pub fn is_retryable(err: &HarnessError) -> bool {
    matches!(err.kind, ErrorKind::Transport | ErrorKind::Setup)
}

/// Call `op` up to `max_retries + 1` times with backoff between attempts.
pub async fn retry_async<T, F, Fut>(
    config: &RetryConfig,
    mut op: F,
    retryable: fn(&HarnessError) -> bool,
) -> Result<RetryOutcome<T>, HarnessError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HarnessError>>,
{
    let start = Instant::now();
    let max_attempts = config.max_retries + 1;
    let mut failures = Vec::new();

    for attempt in 0..max_attempts {
        if start.elapsed() >= config.overall_timeout {
            warn!(target: "hf.messenger.retry", attempt, "overall timeout exceeded");
            return Err(HarnessError::setup("retry budget exhausted")
                .with_context("timeout_ms", config.overall_timeout.as_millis() as u64)
                .with_context("failures", &failures));
        }

        debug!(target: "hf.messenger.retry", attempt, max_attempts, "attempting operation");
        match op().await {
            Ok(value) => {
                return Ok(RetryOutcome {
                    value,
                    attempts: attempt + 1,
                    failures,
                });
            }
            Err(err) => {
                if !retryable(&err) || attempt + 1 >= max_attempts {
                    warn!(target: "hf.messenger.retry", error = %err, attempt, "giving up");
                    return Err(err);
                }
                let delay = compute_delay(config, attempt);
                warn!(
                    target: "hf.messenger.retry",
                    error = %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, retrying"
                );
                failures.push(err.to_string());
                let remaining = config.overall_timeout.saturating_sub(start.elapsed());
                tokio::time::sleep(delay.min(remaining)).await;
            }
        }
    }

    Err(HarnessError::new(ErrorKind::Internal, "retry loop exited without a result"))
}
