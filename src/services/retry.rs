use std::future::Future;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Bounds for one upstream call: a per-attempt timeout, how often timeouts and
/// malformed model output may be retried, and the base backoff between
/// timeout retries (doubled on every retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_timeout_retries: u32,
    pub max_malformed_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_timeout_retries: 2,
            max_malformed_retries: 0,
            backoff: Duration::from_secs(1),
        }
    }

    pub fn with_max_timeout_retries(mut self, retries: u32) -> Self {
        self.max_timeout_retries = retries;
        self
    }

    pub fn with_max_malformed_retries(mut self, retries: u32) -> Self {
        self.max_malformed_retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn delay_for(&self, retry: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// Runs `call` under `policy`. Every attempt is bounded by the timeout; an
/// elapsed attempt becomes [`AppError::UpstreamTimeout`]. Any other error is
/// returned immediately.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut timeout_retries = 0;
    let mut malformed_retries = 0;

    loop {
        let outcome = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::UpstreamTimeout(operation.to_string())),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(AppError::UpstreamTimeout(_)) if timeout_retries < policy.max_timeout_retries => {
                timeout_retries += 1;
                let delay = policy.delay_for(timeout_retries);
                log::warn!(
                    "{} timed out, retry {}/{} in {:?}",
                    operation,
                    timeout_retries,
                    policy.max_timeout_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(AppError::MalformedLlmOutput(ref detail))
                if malformed_retries < policy.max_malformed_retries =>
            {
                malformed_retries += 1;
                log::warn!(
                    "{} returned malformed output ({}), retry {}/{}",
                    operation,
                    detail,
                    malformed_retries,
                    policy.max_malformed_retries
                );
            }
            Err(err) => return Err(err),
        }
    }
}
