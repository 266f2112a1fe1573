use backoff::{future::retry, ExponentialBackoff};
use std::future::Future;
use std::time::Duration;

use crate::utils::error::AppError;

/// Whether an error is worth retrying.
///
/// Only transient scheduler failures (timeouts, connection problems, 5xx)
/// qualify. LLM calls are never retried here; the credit gate compensates
/// instead.
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        AppError::SchedulerError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout")
                || msg_lower.contains("timed out")
                || msg_lower.contains("429")
                || msg_lower.contains("500")
                || msg_lower.contains("502")
                || msg_lower.contains("503")
                || msg_lower.contains("504")
                || msg_lower.contains("server error")
                || msg_lower.contains("connection")
                || msg_lower.contains("network")
        }
        _ => false,
    }
}

fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(500),
        max_interval: Duration::from_secs(5),
        max_elapsed_time: Some(Duration::from_secs(15)),
        multiplier: 2.0,
        ..Default::default()
    }
}

/// Run an async operation with exponential backoff on transient errors.
pub async fn with_retry<F, Fut, T>(operation: F) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let backoff = create_backoff();

    retry(backoff, || async {
        match operation().await {
            Ok(result) => Ok(result),
            Err(e) => {
                if is_retryable_error(&e) {
                    tracing::warn!(error = %e, "Retryable error, will retry...");
                    Err(backoff::Error::transient(e))
                } else {
                    Err(backoff::Error::permanent(e))
                }
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn is_retryable_error_should_return_true_for_timeout() {
        let error = AppError::SchedulerError("request timeout".to_string());
        assert!(is_retryable_error(&error));
    }

    #[test]
    fn is_retryable_error_should_return_true_for_5xx() {
        for msg in ["HTTP 500", "HTTP 502", "HTTP 503", "HTTP 504"] {
            let error = AppError::SchedulerError(msg.to_string());
            assert!(is_retryable_error(&error), "{msg} should be retryable");
        }
    }

    #[test]
    fn is_retryable_error_should_return_false_for_not_found() {
        let error = AppError::NotFound("schedule missing".to_string());
        assert!(!is_retryable_error(&error));
    }

    #[test]
    fn is_retryable_error_should_return_false_for_llm_errors() {
        assert!(!is_retryable_error(&AppError::LlmRateLimited));
        assert!(!is_retryable_error(&AppError::LlmTemporaryError));
    }

    #[tokio::test]
    async fn with_retry_should_succeed_on_first_try() {
        let result = with_retry(|| async { Ok::<_, AppError>("success") }).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "success");
    }

    #[tokio::test]
    async fn with_retry_should_retry_on_transient_error() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry(|| {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(AppError::SchedulerError("connection reset".to_string()))
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_should_not_retry_on_permanent_error() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry(|| {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::NotFound("gone".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
