//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Transient failures (network, I/O, flood control) are retried with
//! exponential backoff and jitter. API rejections such as "bot was blocked"
//! are returned at once.

use soundgate_core::config::{
    TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
};
use std::future::Future;
use std::time::Duration;
use teloxide::RequestError;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

/// Whether retrying `error` may succeed.
#[must_use]
pub fn is_transient(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_)
    )
}

/// Retry a Telegram API operation with exponential backoff.
///
/// The retry strategy uses exponential backoff with jitter to avoid thundering herd:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max attempts: 3 (see the constants in `soundgate_core::config`)
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    RetryIf::spawn(retry_strategy, operation, is_transient)
        .await
        .inspect_err(|e| {
            if is_transient(e) {
                warn!(
                    attempts = TELEGRAM_API_MAX_RETRIES,
                    error = %e,
                    "Telegram API operation failed after retries"
                );
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use teloxide::ApiError;

    #[test]
    fn test_api_errors_are_not_transient() {
        assert!(!is_transient(&RequestError::Api(ApiError::BotBlocked)));
        assert!(!is_transient(&RequestError::Api(ApiError::ChatNotFound)));
    }

    #[tokio::test]
    async fn test_api_error_is_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), RequestError> = retry_telegram_operation(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(RequestError::Api(ApiError::BotBlocked)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_is_returned() {
        let result = retry_telegram_operation(|| async { Ok::<_, RequestError>(7) }).await;
        assert!(matches!(result, Ok(7)));
    }
}
