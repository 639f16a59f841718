//! Buffered socket reader with pushback.
//!
//! The response parser reads the head one byte at a time and occasionally has
//! to hand bytes back (a server that starts the body without the blank line).
//! `WireReader` keeps a single pending buffer plus a cursor; pushed-back bytes
//! are placed in front of whatever is still pending.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::BUFFER_SIZE;
use crate::error_handling::{FetchError, Phase};
use crate::utils::with_timeout;

pub(crate) struct WireReader<R> {
    inner: R,
    pending: Vec<u8>,
    cursor: usize,
    read_timeout: Option<Duration>,
}

impl<R: AsyncRead + Unpin> WireReader<R> {
    /// Wraps `inner`; every read from it is bounded by `read_timeout`.
    pub(crate) fn new(inner: R, read_timeout: Option<Duration>) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(BUFFER_SIZE),
            cursor: 0,
            read_timeout,
        }
    }

    /// Makes sure at least one byte is pending. Returns `false` at end of stream.
    async fn fill(&mut self) -> Result<bool, FetchError> {
        if self.cursor < self.pending.len() {
            return Ok(true);
        }

        self.pending.resize(BUFFER_SIZE, 0);
        self.cursor = 0;
        let read = with_timeout(
            Phase::Read,
            self.read_timeout,
            self.inner.read(&mut self.pending[..]),
        )
        .await;
        let n = match read {
            Ok(n) => n,
            Err(e) => {
                self.pending.clear();
                return Err(e);
            }
        };
        self.pending.truncate(n);
        Ok(n > 0)
    }

    /// Reads one byte, `None` at end of stream.
    pub(crate) async fn read_byte(&mut self) -> Result<Option<u8>, FetchError> {
        if !self.fill().await? {
            return Ok(None);
        }
        let byte = self.pending[self.cursor];
        self.cursor += 1;
        Ok(Some(byte))
    }

    /// Returns the next byte without consuming it, `None` at end of stream.
    pub(crate) async fn peek_byte(&mut self) -> Result<Option<u8>, FetchError> {
        if !self.fill().await? {
            return Ok(None);
        }
        Ok(Some(self.pending[self.cursor]))
    }

    /// Pushes `bytes` back so they are read again before anything else.
    pub(crate) fn unread(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut pending = Vec::with_capacity(bytes.len() + self.pending.len() - self.cursor);
        pending.extend_from_slice(bytes);
        pending.extend_from_slice(&self.pending[self.cursor..]);
        self.pending = pending;
        self.cursor = 0;
    }

    /// Reads up to `out.len()` bytes. Returns 0 only at end of stream.
    pub(crate) async fn read(&mut self, out: &mut [u8]) -> Result<usize, FetchError> {
        if out.is_empty() || !self.fill().await? {
            return Ok(0);
        }
        let available = &self.pending[self.cursor..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.cursor += n;
        Ok(n)
    }

    /// Bytes already buffered but not yet consumed.
    pub(crate) fn buffered(&self) -> usize {
        self.pending.len() - self.cursor
    }
}
