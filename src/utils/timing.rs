//! Deadline helpers for socket operations.

use std::future::Future;
use std::io;
use std::time::Duration;

use crate::error_handling::{FetchError, Phase};

/// Awaits an I/O future, failing with `FetchError::Timeout` once `limit` expires.
///
/// `None` waits indefinitely. I/O errors are converted with `FetchError::from`,
/// except `TimedOut` errors raised by the OS, which are reported as a timeout of
/// the same phase.
pub async fn with_timeout<F, T>(phase: Phase, limit: Option<Duration>, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = io::Result<T>>,
{
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| FetchError::Timeout { phase, limit })?,
        None => fut.await,
    };

    result.map_err(|e| match (e.kind(), limit) {
        (io::ErrorKind::TimedOut, Some(limit)) => FetchError::Timeout { phase, limit },
        _ => FetchError::Io(e),
    })
}
