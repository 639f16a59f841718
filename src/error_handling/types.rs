//! Error type definitions.
//!
//! This module defines all error types used throughout the fetcher.

use std::fmt;
use std::io;
use std::time::Duration;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Errors raised while turning a `TlsPolicy` into a client configuration.
///
/// All of these happen before any byte is sent to the network.
#[derive(Error, Debug)]
pub enum TlsError {
    /// None of the preferred protocol versions is implemented locally.
    #[error("No supported TLS protocol among preferred {preferred:?}")]
    NoProtocols {
        /// The caller's preference list
        preferred: Vec<String>,
    },

    /// None of the preferred cipher suites is implemented locally.
    #[error("No supported TLS cipher suite among preferred {preferred:?}")]
    NoCipherSuites {
        /// The caller's preference list
        preferred: Vec<String>,
    },

    /// The enabled protocols and cipher suites do not form a usable configuration.
    #[error("TLS negotiation setup failed: {0}")]
    Config(#[from] rustls::Error),

    /// The host cannot be used as a TLS server name.
    #[error("Invalid TLS server name '{0}'")]
    InvalidServerName(String),
}

/// Errors raised by the rendering collaborator.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No rendering engine is configured.
    #[error("No rendering engine configured for {0}")]
    Unavailable(String),

    /// The rendering engine could not be started.
    #[error("Failed to start rendering engine '{program}': {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The page did not finish loading within the page-load timeout.
    #[error("Rendering timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The rendering engine exited unsuccessfully.
    #[error("Rendering engine exited with {status}: {stderr}")]
    Failed {
        /// Exit status description
        status: String,
        /// Captured standard error (trimmed)
        stderr: String,
    },
}

/// The step of a fetch during which a timeout expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// TCP connect to the target or proxy
    Connect,
    /// TLS handshake
    TlsHandshake,
    /// Writing the request
    Write,
    /// Reading the response
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Connect => "connect",
            Phase::TlsHandshake => "TLS handshake",
            Phase::Write => "request write",
            Phase::Read => "response read",
        })
    }
}

/// Every way a single fetch can fail.
#[derive(Error, Debug)]
pub enum FetchError {
    // Configuration errors
    /// The URL scheme is neither `http` nor `https`.
    #[error("Unknown scheme (not http/https) for url: {0}")]
    UnsupportedScheme(String),

    /// The URL has no usable host.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// TLS could not be configured from the policy.
    #[error(transparent)]
    Tls(#[from] TlsError),

    // Connection errors
    /// TCP connect (including name resolution) failed.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// `host:port` that was dialed
        addr: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// A step did not complete in time.
    #[error("{phase} timed out after {}s", .limit.as_secs_f64())]
    Timeout {
        /// Step that timed out
        phase: Phase,
        /// Limit that was exceeded
        limit: Duration,
    },

    /// The TLS handshake failed.
    #[error("TLS handshake with {host} failed: {source}")]
    Handshake {
        /// Server name used for the handshake
        host: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The proxy refused to open a tunnel.
    #[error("Proxy refused tunnel to {target} with status {status}")]
    ProxyTunnel {
        /// `host:port` the tunnel was requested for
        target: String,
        /// Status code returned by the proxy
        status: u16,
    },

    /// Any other socket error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Protocol errors
    /// The status line has no integer status code.
    #[error("Bad status line '{line}'")]
    MalformedStatusLine {
        /// Status line as received
        line: String,
    },

    /// A header line has no colon and is not blank.
    #[error("No colon in header: {line}")]
    MissingColon {
        /// Header line as received
        line: String,
    },

    /// The stream ended before a line terminator.
    #[error("Unexpected end of stream while reading the response head")]
    UnexpectedEof,

    /// The server kept sending interim `100` heads.
    #[error("Gave up after {0} interim 100 responses")]
    TooManyInterimResponses(usize),

    /// The response head has more header lines than allowed.
    #[error("Response has more than {0} header lines")]
    TooManyHeaders(usize),

    /// A status or header line ran past the length limit without ending.
    #[error("Response head line is longer than {0} bytes")]
    HeadLineTooLong(usize),

    // Content errors
    /// HTML reached the raw-socket path, which only handles non-HTML documents.
    #[error("Processing HTTP content type '{0}' with the raw-socket fetcher")]
    HtmlContent(String),

    /// The declared `Content-Length` is not an integer.
    #[error("Bad content length: {0}")]
    BadContentLength(String),

    /// The body could not be decoded.
    #[error("Failed to decode {encoding} content: {source}")]
    Decompression {
        /// Content-Encoding that was being decoded
        encoding: &'static str,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    // Rendering errors
    /// The rendering collaborator failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Broad classes of fetch failures.
///
/// Callers use the category (or [`FetchError::is_retryable`]) to decide whether
/// a URL is worth fetching again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorCategory {
    /// Rejected before any network I/O
    Configuration,
    /// Connect, handshake, tunnel or socket failure
    Connection,
    /// A connect, handshake, write or read deadline expired
    Timeout,
    /// The server's response head could not be parsed
    Protocol,
    /// The body could not be accepted or decoded
    Content,
    /// The rendering collaborator failed
    Render,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCategory {
    /// Short human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration error",
            ErrorCategory::Connection => "connection error",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Protocol => "protocol error",
            ErrorCategory::Content => "content error",
            ErrorCategory::Render => "render error",
        }
    }
}
