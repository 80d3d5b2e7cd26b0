//! Retry utilities with exponential backoff for page fetches.

use std::time::Duration;
use tokio::time::sleep;

use crate::config::RetrySettings;
use crate::sources::HarvestError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryConfig {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_multiplier: settings.backoff_multiplier,
        }
    }
}

impl RetryConfig {
    /// Set the attempt limit
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Backoff delay after the given failed attempt (1-based), before error hints
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
        // NaN and negative products collapse to zero
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()).max(0.0))
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, PartialEq)]
pub enum TransientError {
    /// Connection failure or 5xx response
    Network,
    /// Request timeout
    Timeout,
    /// Rate limit exceeded (with optional retry-after seconds)
    RateLimit(Option<u64>),
}

impl TransientError {
    /// Classify a harvest error; `None` means retrying will not help.
    pub fn from_harvest_error(err: &HarvestError) -> Option<Self> {
        match err {
            HarvestError::Transport(msg) => {
                let msg_lower = msg.to_lowercase();
                if msg_lower.contains("timed out") || msg_lower.contains("timeout") {
                    Some(TransientError::Timeout)
                } else {
                    Some(TransientError::Network)
                }
            }
            HarvestError::RateLimited { retry_after } => {
                Some(TransientError::RateLimit(*retry_after))
            }
            _ => None,
        }
    }

    /// Get the recommended delay for this error
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::RateLimit(Some(seconds)) => Duration::from_secs(*seconds),
            TransientError::RateLimit(None) => Duration::from_secs(30),
            TransientError::Timeout => Duration::from_secs(2),
            TransientError::Network => Duration::from_secs(1),
        }
    }
}

/// Execute an async operation with retry logic
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, HarvestError>>,
{
    with_retry_notify(config, |_, _, _| {}, operation).await
}

/// Like [`with_retry`], calling `notify(attempt, error, delay)` before each backoff sleep.
pub async fn with_retry_notify<T, F, Fut, N>(
    config: RetryConfig,
    mut notify: N,
    mut operation: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, HarvestError>>,
    N: FnMut(u32, &HarvestError, Duration),
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error = match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Err(error) => error,
        };

        let Some(transient) = TransientError::from_harvest_error(&error) else {
            return Err(error);
        };

        if attempts >= config.max_attempts {
            tracing::warn!("Operation failed after {} attempts: {}", attempts, error);
            return Err(error);
        }

        let delay = std::cmp::max(config.backoff_delay(attempts), transient.recommended_delay())
            .min(config.max_delay);

        tracing::debug!(
            "Transient error on attempt {}: {:?}, retrying in {:?}",
            attempts,
            transient,
            delay
        );
        notify(attempts, &error, delay);

        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(fast_config(3), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(fast_config(4), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    if *call_count.borrow() < 3 {
                        Err(HarvestError::Transport("connection reset".to_string()))
                    } else {
                        Ok("success")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_at_attempt_limit() {
        let call_count = Rc::new(RefCell::new(0));
        let notified = Rc::new(RefCell::new(Vec::new()));

        let result: Result<(), HarvestError> = {
            let call_count = call_count.clone();
            let notified = notified.clone();
            with_retry_notify(
                fast_config(3),
                move |attempt, _, _| notified.borrow_mut().push(attempt),
                move || {
                    let call_count = call_count.clone();
                    async move {
                        *call_count.borrow_mut() += 1;
                        Err(HarvestError::Transport("connection refused".to_string()))
                    }
                },
            )
        }
        .await;

        assert!(matches!(result, Err(HarvestError::Transport(_))));
        assert_eq!(*call_count.borrow(), 3);
        assert_eq!(*notified.borrow(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_retry_returns_permanent_error() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<&str, HarvestError> = {
            let call_count = call_count.clone();
            with_retry(fast_config(5), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(HarvestError::Blocked(403))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(HarvestError::Blocked(403))));
        assert_eq!(*call_count.borrow(), 1); // Should not retry on permanent error
    }

    #[test]
    fn test_transient_error_detection() {
        let rate_limit = HarvestError::RateLimited { retry_after: Some(7) };
        assert_eq!(
            TransientError::from_harvest_error(&rate_limit),
            Some(TransientError::RateLimit(Some(7)))
        );

        let timeout = HarvestError::Transport("operation timed out".to_string());
        assert_eq!(
            TransientError::from_harvest_error(&timeout),
            Some(TransientError::Timeout)
        );

        let malformed = HarvestError::MalformedDocument("no container".to_string());
        assert!(TransientError::from_harvest_error(&malformed).is_none());
        assert!(TransientError::from_harvest_error(&HarvestError::Blocked(403)).is_none());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        };

        assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(config.backoff_delay(4), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_never_negative() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: -2.0,
        };

        for attempt in 1..=5 {
            assert!(config.backoff_delay(attempt) <= Duration::from_millis(500));
        }
        assert_eq!(config.backoff_delay(2), Duration::ZERO);

        let nan = RetryConfig {
            backoff_multiplier: f64::NAN,
            ..config
        };
        assert!(nan.backoff_delay(3) <= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_retry_with_negative_multiplier_gives_up_cleanly() {
        let config = RetryConfig {
            backoff_multiplier: -2.0,
            ..fast_config(3)
        };

        let result: Result<(), HarvestError> = with_retry(config, || async {
            Err(HarvestError::Transport("connection reset".to_string()))
        })
        .await;

        assert!(matches!(result, Err(HarvestError::Transport(_))));
    }

    #[test]
    fn test_recommended_delay() {
        assert_eq!(
            TransientError::RateLimit(Some(30)).recommended_delay(),
            Duration::from_secs(30)
        );
        assert_eq!(
            TransientError::Network.recommended_delay(),
            Duration::from_secs(1)
        );
    }
}
