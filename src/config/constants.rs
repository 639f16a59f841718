//! Configuration constants.
//!
//! This module defines the defaults and hard limits used throughout the fetcher,
//! including timeouts, buffer sizes, header values and TLS preference lists.

// Socket I/O
/// Size of the socket read buffer and of each body read chunk (8 KiB)
pub const BUFFER_SIZE: usize = 8 * 1024;

// Network operation timeouts
/// Default connect/read timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// TLS handshake timeout in seconds
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

// Response parsing limits
/// Maximum number of interim `100 Continue` heads accepted before the real status.
/// A server that keeps sending interim heads past this point is treated as broken.
pub const MAX_INTERIM_RESPONSES: usize = 5;
/// Maximum number of header lines accepted in a single response head.
pub const MAX_HEADER_COUNT: usize = 100;
/// Maximum length in bytes of one status or header line, continuations included.
pub const MAX_HEAD_LINE_LENGTH: usize = 16 * 1024;

// Response and body size limits
/// Default maximum response body size in bytes (2MB)
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 2 * 1024 * 1024;

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via the `--user-agent` CLI flag. A blank user agent
/// is allowed but logged as a warning, and the header is then omitted.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Value sent in every `Accept-Encoding` request header.
pub const ACCEPT_ENCODING: &str = "x-gzip, gzip, deflate";
/// Default `Accept` request header value
pub const DEFAULT_ACCEPT: &str = "text/html,application/xml;q=0.9,*/*;q=0.8";
/// Default `Accept-Language` request header value
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-us,en-gb,en;q=0.7,*;q=0.3";
/// Default `Accept-Charset` request header value
pub const DEFAULT_ACCEPT_CHARSET: &str = "utf-8,iso-8859-1;q=0.7,*;q=0.7";

// Fetch strategy routing
/// File extensions fetched over the raw socket instead of the rendering engine
pub const DEFAULT_RAW_FILE_EXTENSIONS: &[&str] = &["pdf"];

// Rendering collaborator
/// Default page-load timeout handed to the rendering engine, in seconds
pub const DEFAULT_PAGE_LOAD_DELAY_SECS: u64 = 3;

// TLS preferences
/// Protocol versions offered by default, most preferred first.
///
/// Only the versions the local TLS stack implements survive the intersection.
pub const DEFAULT_TLS_PROTOCOLS: &[&str] = &["TLSv1.3", "TLSv1.2", "TLSv1.1", "TLSv1", "SSLv3"];

/// Cipher suites offered by default (IANA names), most preferred first.
pub const DEFAULT_TLS_CIPHER_SUITES: &[&str] = &[
    "TLS_AES_256_GCM_SHA384",
    "TLS_AES_128_GCM_SHA256",
    "TLS_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256",
    "TLS_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_RSA_WITH_AES_128_GCM_SHA256",
];
