//! Socket setup: connect, proxy tunnel, and the plain-or-TLS stream.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::error_handling::{FetchError, Phase};
use crate::fetch::target::Target;
use crate::http::parser::read_response_head;
use crate::http::reader::WireReader;
use crate::utils::with_timeout;

/// An open connection to the origin or proxy.
pub(crate) enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Connection {
    /// Flushes and closes the write side. Errors are logged, not returned.
    pub(crate) async fn close(mut self) {
        if let Err(e) = self.shutdown().await {
            debug!("Socket shutdown failed: {e}");
        }
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Connection::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Opens a TCP connection to `host:port` within `timeout`.
///
/// Name resolution happens inside the same deadline.
pub(crate) async fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, FetchError> {
    debug!("Connecting to {host}:{port}");
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| FetchError::Timeout {
            phase: Phase::Connect,
            limit: timeout,
        })?
        .map_err(|source| FetchError::Connect {
            addr: format!("{host}:{port}"),
            source,
        })?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not set TCP_NODELAY: {e}");
    }
    Ok(stream)
}

/// Writes all of `bytes` and flushes, bounded by `timeout`.
pub(crate) async fn write_all<W>(stream: &mut W, bytes: &[u8], timeout: Duration) -> Result<(), FetchError>
where
    W: AsyncWrite + Unpin,
{
    with_timeout(Phase::Write, Some(timeout), async {
        stream.write_all(bytes).await?;
        stream.flush().await
    })
    .await
}

/// Asks the proxy on `stream` to open a tunnel to `target`.
///
/// # Errors
///
/// `FetchError::ProxyTunnel` if the proxy answers with anything but 2xx, plus
/// every error the response parser can raise.
pub(crate) async fn open_tunnel(
    stream: &mut TcpStream,
    target: &Target,
    timeout: Duration,
) -> Result<(), FetchError> {
    let authority = target.authority();
    let request = format!("CONNECT {authority} HTTP/1.0\r\nHost: {authority}\r\n\r\n");
    debug!("Requesting proxy tunnel to {authority}");
    write_all(stream, request.as_bytes(), timeout).await?;

    let mut reader = WireReader::new(&mut *stream, Some(timeout));
    let head = read_response_head(&mut reader, false).await?;
    if !(200..300).contains(&head.status) {
        return Err(FetchError::ProxyTunnel {
            target: authority,
            status: head.status,
        });
    }
    if reader.buffered() > 0 {
        warn!(
            "Proxy sent {} bytes after its tunnel reply, discarding them",
            reader.buffered()
        );
    }
    debug!("Proxy tunnel to {authority} established ({})", head.status);
    Ok(())
}
