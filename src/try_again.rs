//! run a fallible async operation until it succeeds or the configured number of attempts
//! is used up, sleeping with capped exponential backoff in between
//!     - success returns the value right away
//!     - the last failure is handed back untouched once attempts run out
//!     - an observer error stops everything immediately

use crate::config::RetryConfig;
use crate::retryable::{NoopObserver, OnRetry, RetryError};
use std::future::Future;

/// Retry `operation` per `config` without an observer.
pub async fn retry<T, E, Op, Fut>(operation: Op, config: &RetryConfig) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    execute(operation, config, NoopObserver).await
}

/// Retry `operation` per `config`, calling `on_retry` after each failed attempt.
pub async fn retry_notify<T, E, O, Op, Fut, N>(
    operation: Op,
    config: &RetryConfig,
    on_retry: N,
) -> Result<T, RetryError<E, O>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(u32, &E) -> Result<(), O>,
{
    execute(operation, config, on_retry).await
}

pub async fn execute<T, E, Op, Fut, Obs>(
    mut operation: Op,
    config: &RetryConfig,
    mut on_retry: Obs,
) -> Result<T, RetryError<E, Obs::Error>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Obs: OnRetry<E>,
{
    //! attempts are numbered from 1 and never overlap
    //! the observer sees attempt `a` before the backoff that follows it, so a failing
    //! observer means attempt `a + 1` is never started
    let max_retries = config.max_retries;
    if max_retries == 0 {
        tracing::warn!("retry called with max_retries = 0, operation not attempted");
        return Err(RetryError::NoAttempts);
    }

    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, max_retries, "operation succeeded after retrying");
                }
                return Ok(value);
            }
            Err(error) => {
                on_retry
                    .on_retry(attempt, &error)
                    .map_err(RetryError::Observer)?;

                if attempt >= max_retries {
                    tracing::error!(attempt, max_retries, "operation failed, no attempts left");
                    return Err(RetryError::Operation(error));
                }

                let delay = config.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying after backoff"
                );
                async_std::task::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
