//! Bounded retry for daemon requests

use crate::Result;
use std::future::Future;
use std::time::Duration;

/// Run `request` up to `attempts` times, sleeping `delay` between tries.
///
/// Only transient failures (the daemon not accepting connections yet) are
/// retried. Error responses from the daemon are returned immediately.
pub async fn with_retry<T, F, Fut>(mut request: F, attempts: u32, delay: Duration) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match request().await {
            Err(err) if err.is_transient() && attempt < attempts => {
                tracing::debug!(attempt, error = %err, "daemon not reachable yet, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
