// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded polling: evaluate a predicate until it holds or time runs out.

use hf_error::{ErrorKind, HarnessError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Builder for one eventual condition.
///
/// ```no_run
/// # async fn demo() -> hf_error::Result<()> {
/// use hf_verify::Await;
/// use std::time::Duration;
///
/// Await::new()
///     .alias("the answer arrives")
///     .at_most(Duration::from_secs(5))
///     .until(|| true)
///     .await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Await {
    alias: Option<String>,
    at_most: Duration,
    poll_delay: Duration,
    poll_interval: Duration,
}

impl Default for Await {
    fn default() -> Self {
        Self::new()
    }
}

impl Await {
    /// Ten second budget, no initial delay, 100 ms between evaluations.
    pub fn new() -> Self {
        Self {
            alias: None,
            at_most: Duration::from_secs(10),
            poll_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Name used in the timeout error.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Total budget, measured from the call to `until`.
    pub fn at_most(mut self, timeout: Duration) -> Self {
        self.at_most = timeout;
        self
    }

    /// Sleep before the first evaluation.
    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Sleep between evaluations.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Poll a synchronous predicate.
    pub async fn until(self, mut predicate: impl FnMut() -> bool) -> Result<()> {
        self.until_async(|| std::future::ready(Ok(predicate()))).await
    }

    /// Poll an asynchronous, fallible predicate. An `Err` ends the wait
    /// immediately and is returned unchanged.
    pub async fn until_async<F, Fut>(self, mut predicate: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let started = Instant::now();
        let deadline = started + self.at_most;
        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }

        let mut evaluations = 0u32;
        loop {
            evaluations += 1;
            if predicate().await? {
                debug!(
                    target: "hf.verify.await",
                    alias = self.alias.as_deref().unwrap_or("condition"),
                    evaluations,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "condition met"
                );
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let nap = self.poll_interval.min(deadline - now);
            tokio::time::sleep(nap).await;
        }

        let alias = self.alias.unwrap_or_else(|| "condition".to_string());
        warn!(target: "hf.verify.await", %alias, evaluations, "condition not met in time");
        Err(HarnessError::new(
            ErrorKind::Assertion,
            format!("{alias} was not fulfilled within {:?}", self.at_most),
        )
        .with_context("timeout_ms", self.at_most.as_millis() as u64)
        .with_context("evaluations", evaluations))
    }
}

/// Sleep for `duration` by waiting for a condition that is always true
/// after an initial delay.
pub async fn wait_for(duration: Duration) -> Result<()> {
    Await::new()
        .alias(format!("waiting {duration:?}"))
        .poll_delay(duration)
        .at_most(duration + Duration::from_secs(5))
        .until(|| true)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_once_the_predicate_holds() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        Await::new()
            .poll_interval(Duration::from_millis(100))
            .until(|| calls.fetch_add(1, Ordering::SeqCst) >= 3)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_the_alias() {
        let err = Await::new()
            .alias("Verify Fibi sent 'x' to 'Ann'")
            .at_most(Duration::from_secs(1))
            .until(|| false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Assertion);
        assert!(err.message.contains("Verify Fibi sent 'x' to 'Ann'"));
    }

    #[tokio::test(start_paused = true)]
    async fn last_evaluation_happens_at_the_deadline() {
        let started = Instant::now();
        let seen = Arc::new(AtomicU32::new(0));
        let at = seen.clone();
        let result = Await::new()
            .at_most(Duration::from_millis(250))
            .poll_interval(Duration::from_millis(100))
            .until(move || {
                at.fetch_add(1, Ordering::SeqCst);
                started.elapsed() >= Duration::from_millis(250)
            })
            .await;
        assert!(result.is_ok());
        // t = 0, 100, 200, 250
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_delay_postpones_the_first_evaluation() {
        let started = Instant::now();
        Await::new()
            .poll_delay(Duration::from_secs(3))
            .at_most(Duration::from_secs(5))
            .until(|| started.elapsed() >= Duration::from_secs(3))
            .await
            .unwrap();
        wait_for(Duration::from_secs(2)).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_errors_end_the_wait() {
        let err = Await::new()
            .until_async(|| async { Err::<bool, _>(HarnessError::transport("down")) })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
    }
}
