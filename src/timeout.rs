//! Deadline wrapper for provider calls

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Run `fut`, failing with [`Error::Timeout`] if it does not finish within `limit`.
pub async fn with_timeout<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation,
            secs: limit.as_secs(),
        }),
    }
}
