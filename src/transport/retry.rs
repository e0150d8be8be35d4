//! Retry loop shared by the network transports.

use std::future::Future;

use super::traits::SharedStats;
use crate::config::RetryConfig;
use crate::{Error, ErrorKind};

/// Failures that may not have reached the store, or that the store asks
/// clients to retry.
fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::Timeout | ErrorKind::Connection | ErrorKind::Unavailable | ErrorKind::RateLimited
    )
}

/// Runs `call` until it succeeds, fails with a non-retriable error, or the
/// retry budget is spent. Every attempt is counted in `stats`.
pub(crate) async fn execute_with_retry<T, F, Fut>(
    config: &RetryConfig,
    stats: &SharedStats,
    mut call: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut retries = 0;

    loop {
        stats.write().requests_sent += 1;

        match call().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                stats.write().requests_failed += 1;

                if retries >= config.max_retries || !is_transient(err.kind()) {
                    return Err(err);
                }
                retries += 1;

                let delay = config.backoff_for(retries);
                tracing::debug!(
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use test_case::test_case;

    use super::*;
    use crate::transport::traits::{Transport, new_stats};

    fn fast_retries(n: u32) -> RetryConfig {
        RetryConfig::with_retries(n).backoff(Duration::from_millis(1), Duration::from_millis(1))
    }

    #[test_case(ErrorKind::Timeout, true)]
    #[test_case(ErrorKind::Connection, true)]
    #[test_case(ErrorKind::Unavailable, true)]
    #[test_case(ErrorKind::RateLimited, true)]
    #[test_case(ErrorKind::FailedPrecondition, false)]
    #[test_case(ErrorKind::InvalidArgument, false)]
    #[test_case(ErrorKind::Unauthorized, false)]
    fn test_is_transient(kind: ErrorKind, expected: bool) {
        assert_eq!(is_transient(kind), expected);
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let stats = new_stats(Some(Transport::Grpc));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), Error> =
            execute_with_retry(&fast_retries(2), &stats, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::timeout("slow"))
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Timeout);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(stats.read().requests_failed, 3);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let stats = new_stats(Some(Transport::Grpc));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = execute_with_retry(&fast_retries(3), &stats, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::unavailable("try again"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        let s = stats.read();
        assert_eq!(s.requests_sent, 3);
        assert_eq!(s.requests_failed, 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let stats = new_stats(Some(Transport::Grpc));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), Error> =
            execute_with_retry(&fast_retries(3), &stats, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::new(ErrorKind::FailedPrecondition, "no such relation"))
            })
            .await;

        assert_eq!(result.unwrap_err().message(), "no such relation");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_makes_one_attempt() {
        let stats = new_stats(Some(Transport::Http));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), Error> =
            execute_with_retry(&RetryConfig::default(), &stats, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::unavailable("down"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
