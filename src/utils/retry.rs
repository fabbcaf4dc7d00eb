//! Bounded retry with exponential backoff for upstream zone downloads.
//!
//! The schedule mirrors the usual HTTP adapter behaviour: the first retry is
//! immediate, retry `n` (n >= 2) waits `backoff_factor * 2^(n-1)`, and every
//! delay is capped by `max_backoff`. A server-provided `Retry-After` replaces
//! the computed delay for that attempt.

use crate::utils::error::EtlError;
use std::future::Future;
use std::time::Duration;

/// Classifies an error as transient.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;

    /// Delay requested by the server, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl IsRetryable for EtlError {
    fn is_retryable(&self) -> bool {
        EtlError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            EtlError::HttpStatus {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_millis(800),
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// 第 `retry` 次重試前的等待時間（從 1 起算）
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(31);
        let delay = self
            .backoff_factor
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_backoff);
        delay.min(self.max_backoff)
    }
}

pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut retry = 0;

    loop {
        match operation(retry + 1).await {
            Ok(value) => {
                if retry > 0 {
                    tracing::debug!(attempts = retry + 1, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && retry < config.max_retries => {
                retry += 1;
                let delay = e
                    .retry_after()
                    .map(|d| d.min(config.max_backoff))
                    .unwrap_or_else(|| config.backoff_for(retry));

                tracing::warn!(
                    error = %e,
                    retry = retry,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "🔁 Transient failure, retrying"
                );

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::debug!(error = %e, attempts = retry + 1, "Retry budget exhausted");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient"),
                TestError::Permanent => write!(f, "permanent"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            backoff_factor: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_backoff_schedule() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_for(1), Duration::ZERO);
        assert_eq!(config.backoff_for(2), Duration::from_millis(1600));
        assert_eq!(config.backoff_for(3), Duration::from_millis(3200));
        assert_eq!(config.backoff_for(5), Duration::from_millis(12800));
        assert_eq!(config.backoff_for(40), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&fast_config(5), |_| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok("payload")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), TestError> = with_retry(&fast_config(5), |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Permanent) }
        })
        .await;

        assert!(matches!(result, Err(TestError::Permanent)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), TestError> = with_retry(&fast_config(3), |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Transient) }
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
