//! Resource waiting with exponential backoff and cancellation support.
//!
//! Provides a generic abstraction for waiting on AWS resources (or any async
//! condition) to become visible, plus the fixed propagation pause applied
//! after first-time permission changes.

use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Wait for a resource to become ready with exponential backoff.
///
/// Uses `backon::ExponentialBuilder` for delay calculation and `tokio::select!`
/// for cancellation support.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `cancel` - Optional cancellation token
/// * `check` - Async function that returns `Ok(true)` when ready, `Ok(false)` to retry
/// * `resource_name` - Name for logging
///
/// # Example
/// ```ignore
/// wait_for_resource(
///     WaitConfig::default(),
///     Some(&cancel_token),
///     || async { Ok(iam.get_role_arn(role).await?.is_some()) },
///     role,
/// ).await?;
/// ```
pub async fn wait_for_resource<F, Fut>(
    config: WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    resource_name: &str,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = tokio::time::Instant::now();
    let mut attempts = 0u32;

    let backoff = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    let mut delays = backoff.into_iter();

    loop {
        attempts += 1;

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            anyhow::bail!("Wait for {} cancelled", resource_name);
        }

        if start.elapsed() >= config.timeout {
            anyhow::bail!(
                "Timeout waiting for {} after {:?} ({} attempts)",
                resource_name,
                config.timeout,
                attempts
            );
        }

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(());
            }
            Ok(false) => {
                let delay = delays.next().unwrap_or(config.max_delay);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancelled(cancel) => {
                        anyhow::bail!("Wait for {} cancelled", resource_name);
                    }
                }
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(e);
            }
        }
    }
}

/// Resolve when the token fires, or never without a token
async fn cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

/// Fixed pause after a first-time trust or permission change.
///
/// IAM changes are eventually consistent; services that assume a freshly
/// created role can be rejected for several seconds. The pause is
/// interruptible and counts how often it was taken.
#[derive(Debug)]
pub struct Propagation {
    delay: Duration,
    cancel: CancellationToken,
    waits: AtomicU32,
}

impl Propagation {
    pub fn new(delay: Duration, cancel: CancellationToken) -> Self {
        Self {
            delay,
            cancel,
            waits: AtomicU32::new(0),
        }
    }

    /// Pause for the propagation delay
    pub async fn wait(&self, reason: &str) -> Result<()> {
        self.waits.fetch_add(1, Ordering::Relaxed);
        info!(reason = %reason, delay_secs = self.delay.as_secs(), "Waiting for IAM propagation");

        tokio::select! {
            _ = tokio::time::sleep(self.delay) => Ok(()),
            _ = self.cancel.cancelled() => anyhow::bail!("Propagation wait for {} cancelled", reason),
        }
    }

    /// Token that interrupts pauses and resource waits of the same run
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of pauses taken so far
    pub fn waits(&self) -> u32 {
        self.waits.load(Ordering::Relaxed)
    }
}
