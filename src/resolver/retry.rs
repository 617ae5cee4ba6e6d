// ABOUTME: Bounded-timeout, single-retry wrapper for external adapter calls
// ABOUTME: Retries only transient failures after a fixed backoff delay
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::Display;
use std::future::Future;

use aafiya_core::errors::{AppError, EstimationError, SourceError};
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::config::ResilienceConfig;

/// Failures that may succeed when tried again
pub trait Transient {
    /// Whether a retry could help
    fn is_transient(&self) -> bool;
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        Self::is_transient(self)
    }
}

impl Transient for EstimationError {
    fn is_transient(&self) -> bool {
        Self::is_transient(self)
    }
}

impl Transient for AppError {
    fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

/// Run `call` with a per-attempt timeout, retrying transient failures
///
/// A timed-out attempt becomes `on_timeout()`, which callers map to their
/// transient variant so it is retried like any other outage.
///
/// # Errors
///
/// Returns the last failure once retries are exhausted, or the first
/// definitive (non-transient) failure
pub async fn call_with_retry<T, E, F, Fut>(
    label: &str,
    config: &ResilienceConfig,
    on_timeout: impl Fn() -> E,
    mut call: F,
) -> Result<T, E>
where
    E: Transient + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retries = 0;
    loop {
        let outcome = timeout(config.timeout(), call())
            .await
            .unwrap_or_else(|_| Err(on_timeout()));

        match outcome {
            Err(error) if error.is_transient() && retries < config.max_retries => {
                retries += 1;
                let backoff_ms = config.retry_backoff_ms;
                warn!(
                    call = %label,
                    retry = retries,
                    error = %error,
                    "Transient failure, retrying after {backoff_ms}ms backoff"
                );
                sleep(config.backoff()).await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use aafiya_core::errors::ErrorCode;

    use super::*;

    fn fast() -> ResilienceConfig {
        ResilienceConfig {
            timeout_ms: 50,
            retry_backoff_ms: 1,
            max_retries: 1,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), SourceError> = call_with_retry(
            "test",
            &fast(),
            || SourceError::unavailable("test", "timeout"),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::rate_limited("test", None))
            },
        )
        .await;
        assert!(matches!(result, Err(SourceError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), SourceError> = call_with_retry(
            "test",
            &fast(),
            || SourceError::unavailable("test", "timeout"),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::not_found("test", "tabbouleh"))
            },
        )
        .await;
        assert!(matches!(result, Err(SourceError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_transient_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, SourceError> = call_with_retry(
            "test",
            &fast(),
            || SourceError::unavailable("test", "timed out"),
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    sleep(Duration::from_millis(500)).await;
                }
                Ok(7)
            },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_generation_outage_is_retried_but_bad_input_is_not() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AppError> = call_with_retry(
            "generation",
            &fast(),
            || AppError::new(ErrorCode::ExternalServiceUnavailable, "timed out"),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::new(ErrorCode::ExternalServiceUnavailable, "503"))
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let invalid: Result<(), AppError> = call_with_retry(
            "generation",
            &fast(),
            || AppError::new(ErrorCode::ExternalServiceUnavailable, "timed out"),
            || async { Err(AppError::invalid_input("empty prompt")) },
        )
        .await;
        assert_eq!(invalid.unwrap_err().code, ErrorCode::InvalidInput);
    }
}
