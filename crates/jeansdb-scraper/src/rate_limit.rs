//! Backoff for page fetches.
//!
//! The site answers 429 or a 5xx now and then during a long crawl. Those, and
//! dropped connections, are retried after a doubling delay. A 404 or any other
//! 4xx means the page itself is wrong and is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// 429, 5xx and transport failures are worth another attempt.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Delay before retry number `attempt + 1`: `base_secs * 2^attempt`,
/// saturating instead of overflowing.
fn backoff_delay(base_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(base_secs.saturating_mul(2u64.saturating_pow(attempt)))
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// has been retried `max_retries` times.
///
/// With the crawler defaults (`JEANSDB_MAX_RETRIES=3`,
/// `JEANSDB_RETRY_BACKOFF_BASE_SECS=2`) a page gets one try plus three
/// retries, spaced 2 s, 4 s and 8 s apart.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= max_retries || !is_retriable(&err) {
            return Err(err);
        }

        let delay = backoff_delay(backoff_base_secs, attempt);
        attempt += 1;
        tracing::warn!(
            retry = attempt,
            max_retries,
            delay_secs = delay.as_secs(),
            error = %err,
            "page fetch failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
