//! Retry with exponential backoff.
//!
//! - [`RetryPolicy`]: how often and how long to wait
//! - [`ExponentialBackoff`]: yields sleep durations with jitter
//! - [`retry`], [`retry_with_policy`] and [`retry_when`]: drive a fallible
//!   async call
//!
//! # Example
//!
//! ```ignore
//! use tablestore_client::{RetryPolicy, retry_with_policy};
//!
//! let policy = RetryPolicy::default(); // 3 retries with exponential backoff
//!
//! let response = retry_with_policy(&policy, || async {
//!     client.call_unary::<GetRowRequest, GetRowResponse>("GetRow", &request).await
//! }).await?;
//! ```
//!
//! # Retryable Errors
//!
//! [`ClientError::is_retryable`] decides. Throttling and transient server
//! codes such as [`ErrorCode::ServerBusy`](tablestore_core::ErrorCode::ServerBusy)
//! and transport errors are retried. Timeouts and internal errors are only
//! retried for idempotent operations, through [`retry_when`] with
//! [`ClientError::is_retryable_for`].
//!
//! Batch calls retry only the failed rows; see
//! [`TablestoreClient::batch_get_row`](crate::TablestoreClient::batch_get_row).

use std::future::Future;
use std::time::Duration;

use crate::ClientError;

/// Default backoff settings.
pub mod defaults {
    use std::time::Duration;

    pub const BASE_DELAY: Duration = Duration::from_secs(1);
    pub const MULTIPLIER: f64 = 1.6;
    /// Delays vary by +/- 20%.
    pub const JITTER: f64 = 0.2;
    pub const MAX_DELAY: Duration = Duration::from_secs(120);
    /// Retries after the first attempt.
    pub const MAX_RETRIES: u32 = 3;
}

/// How a call is retried.
///
/// The n-th retry waits `base_delay * multiplier^(n-1)`, capped at
/// `max_delay` and spread by `jitter`.
///
/// ```
/// use tablestore_client::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30));
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    /// At least 1.0.
    pub multiplier: f64,
    /// Between 0.0 and 1.0.
    pub jitter: f64,
    pub max_delay: Duration,
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: defaults::BASE_DELAY,
            multiplier: defaults::MULTIPLIER,
            jitter: defaults::JITTER,
            max_delay: defaults::MAX_DELAY,
            max_retries: defaults::MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never retry.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Short delays for latency-sensitive reads: 50ms base, 1s cap, 5 retries.
    pub fn aggressive() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            max_retries: 5,
            ..Default::default()
        }
    }

    /// Long delays for bulk imports: 2s base, 5min cap, 10 retries.
    pub fn patient() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(300),
            max_retries: 10,
            ..Default::default()
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// # Panics
    ///
    /// Panics if `multiplier` is less than 1.0.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier >= 1.0, "multiplier must be >= 1.0");
        self.multiplier = multiplier;
        self
    }

    /// # Panics
    ///
    /// Panics if `jitter` is not between 0.0 and 1.0.
    pub fn jitter(mut self, jitter: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&jitter),
            "jitter must be between 0.0 and 1.0"
        );
        self.jitter = jitter;
        self
    }

    /// Check the fields set directly rather than through the builder methods.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.base_delay > self.max_delay {
            return Err("base_delay must not exceed max_delay");
        }
        if self.multiplier < 1.0 {
            return Err("multiplier must be >= 1.0");
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err("jitter must be between 0.0 and 1.0");
        }
        Ok(())
    }

    /// Start a fresh backoff sequence.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.clone())
    }
}

/// One backoff sequence, consumed retry by retry.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    policy: RetryPolicy,
    /// Un-jittered delay of the next retry.
    current_delay_secs: f64,
    attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(policy: RetryPolicy) -> Self {
        let current_delay_secs = policy.base_delay.as_secs_f64();
        Self {
            policy,
            current_delay_secs,
            attempts: 0,
        }
    }

    /// Retries handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.policy.max_retries
    }

    /// Delay before the next retry. Counts as one retry.
    pub fn next_delay(&mut self) -> Duration {
        let max = self.policy.max_delay.as_secs_f64();
        let delay = self.current_delay_secs;

        // delay * (1 + jitter * random(-1, 1))
        let jittered = if self.policy.jitter > 0.0 {
            let spread = rand::random::<f64>() * 2.0 - 1.0;
            delay * (1.0 + self.policy.jitter * spread)
        } else {
            delay
        };

        self.current_delay_secs = (delay * self.policy.multiplier).min(max);
        self.attempts += 1;

        Duration::from_secs_f64(jittered.min(max).max(0.0))
    }

    /// The next delay, or `None` once the policy is exhausted.
    pub fn next_retry(&mut self) -> Option<Duration> {
        self.can_retry().then(|| self.next_delay())
    }
}

/// Retry with [`RetryPolicy::default()`].
pub async fn retry<F, Fut, T>(f: F) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    retry_with_policy(&RetryPolicy::default(), f).await
}

/// Retry errors for which [`ClientError::is_retryable`] holds.
///
/// Non-retryable errors are returned immediately.
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, f: F) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    retry_when(policy, ClientError::is_retryable, f).await
}

/// Retry errors accepted by `should_retry` until the policy runs out.
///
/// # Example
///
/// ```ignore
/// use tablestore_client::{RetryPolicy, retry_when};
///
/// // a read: timeouts are safe to retry
/// let response = retry_when(&RetryPolicy::aggressive(), |e| e.is_retryable_for(true), || async {
///     client.call_unary::<GetRowRequest, GetRowResponse>("GetRow", &request).await
/// }).await?;
/// ```
pub async fn retry_when<F, Fut, T, P>(
    policy: &RetryPolicy,
    should_retry: P,
    f: F,
) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
    P: Fn(&ClientError) -> bool,
{
    if let Err(msg) = policy.validate() {
        return Err(ClientError::Config(msg.to_string()));
    }

    let mut backoff = policy.backoff();

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if should_retry(&e) && backoff.can_retry() => {
                let delay = backoff.next_delay();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    error = %e,
                    attempt = backoff.attempts(),
                    delay_ms = delay.as_millis(),
                    "retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
