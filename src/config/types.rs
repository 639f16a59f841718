//! Configuration types.
//!
//! This module defines the library configuration (`FetchConfig` and its parts)
//! and the logging enums shared with the CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_ACCEPT, DEFAULT_ACCEPT_CHARSET, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_MAX_CONTENT_LENGTH,
    DEFAULT_PAGE_LOAD_DELAY_SECS, DEFAULT_RAW_FILE_EXTENSIONS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_TLS_CIPHER_SUITES, DEFAULT_TLS_PROTOCOLS, DEFAULT_USER_AGENT,
    TLS_HANDSHAKE_TIMEOUT_SECS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// TLS negotiation policy.
///
/// The preference lists are intersected with what the local TLS stack
/// implements; the intersection is what gets enabled for the handshake.
#[derive(Debug, Clone)]
pub struct TlsPolicy {
    /// Validate the server certificate chain against the bundled trust store.
    /// Disabling this accepts any certificate and must be an explicit choice.
    pub verify_certificates: bool,
    /// Preferred protocol versions (`TLSv1.2`, `TLSv1.3`, ...)
    pub preferred_protocols: Vec<String>,
    /// Preferred cipher suites by IANA name
    pub preferred_cipher_suites: Vec<String>,
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self {
            verify_certificates: true,
            preferred_protocols: DEFAULT_TLS_PROTOCOLS.iter().map(|p| p.to_string()).collect(),
            preferred_cipher_suites: DEFAULT_TLS_CIPHER_SUITES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Forward proxy settings.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Proxy host name or address
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Target hosts that are contacted directly even though a proxy is configured
    pub exceptions: Vec<String>,
}

impl ProxyConfig {
    /// Returns `true` if requests to `host` should go through this proxy.
    pub fn applies_to(&self, host: &str) -> bool {
        !self
            .exceptions
            .iter()
            .any(|exception| exception.eq_ignore_ascii_case(host))
    }
}

/// Verbatim capture switches for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Keep the serialized request exactly as it was written to the socket
    pub request: bool,
    /// Keep the response status line and header lines exactly as received
    pub response_headers: bool,
    /// Keep the IP address of the socket peer
    pub ip_address: bool,
}

/// Options handed to the rendering collaborator.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// How long the engine may spend loading the page
    pub page_load_timeout: Duration,
    /// Fixed delay the engine waits after load before the markup is taken
    pub settle_delay: Option<Duration>,
    /// Directory where a screenshot of the rendered page is written, if any
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(DEFAULT_PAGE_LOAD_DELAY_SECS),
            settle_delay: None,
            screenshot_dir: None,
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the fetcher. It is built once
/// and never mutated while fetches run, so one `Fetcher` can serve any number
/// of concurrent fetches.
///
/// # Examples
///
/// ```
/// use rawfetch::FetchConfig;
/// use std::time::Duration;
///
/// let config = FetchConfig {
///     timeout: Duration::from_secs(5),
///     max_content_length: Some(64 * 1024),
///     ..Default::default()
/// };
/// assert!(config.tls.verify_certificates);
/// ```
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Connect and per-read timeout
    pub timeout: Duration,

    /// TLS handshake timeout
    pub tls_handshake_timeout: Duration,

    /// TLS negotiation policy
    pub tls: TlsPolicy,

    /// Forward proxy, if any
    pub proxy: Option<ProxyConfig>,

    /// Maximum body size in bytes (`None` = unbounded)
    pub max_content_length: Option<usize>,

    /// Send the `Cookie` header when the caller supplies a cookie
    pub cookies_enabled: bool,

    /// Send `If-Modified-Since` when the caller supplies a modification time
    pub if_modified_since_enabled: bool,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Accept-Language header value (`None` = omitted)
    pub accept_language: Option<String>,

    /// Accept-Charset header value (`None` = omitted)
    pub accept_charset: Option<String>,

    /// Accept header value (`None` = omitted)
    pub accept: Option<String>,

    /// Verbatim capture switches
    pub capture: CaptureOptions,

    /// URL file extensions routed to the raw socket instead of the rendering engine
    pub raw_file_extensions: Vec<String>,

    /// Options for the rendering collaborator
    pub render: RenderOptions,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            tls_handshake_timeout: Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
            tls: TlsPolicy::default(),
            proxy: None,
            max_content_length: Some(DEFAULT_MAX_CONTENT_LENGTH),
            cookies_enabled: true,
            if_modified_since_enabled: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: Some(DEFAULT_ACCEPT_LANGUAGE.to_string()),
            accept_charset: Some(DEFAULT_ACCEPT_CHARSET.to_string()),
            accept: Some(DEFAULT_ACCEPT.to_string()),
            capture: CaptureOptions::default(),
            raw_file_extensions: DEFAULT_RAW_FILE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            render: RenderOptions::default(),
        }
    }
}

impl FetchConfig {
    /// Returns the proxy to use for `host`, honouring the exception list.
    pub fn proxy_for(&self, host: &str) -> Option<&ProxyConfig> {
        self.proxy.as_ref().filter(|proxy| proxy.applies_to(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.tls_handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.max_content_length, Some(2 * 1024 * 1024));
        assert!(config.tls.verify_certificates);
        assert!(config.proxy.is_none());
        assert!(config.cookies_enabled);
        assert!(config.if_modified_since_enabled);
        assert_eq!(config.raw_file_extensions, vec!["pdf".to_string()]);
        assert!(!config.capture.request);
        assert!(!config.capture.response_headers);
    }

    #[test]
    fn test_proxy_exceptions_are_case_insensitive() {
        let config = FetchConfig {
            proxy: Some(ProxyConfig {
                host: "proxy.internal".to_string(),
                port: 3128,
                exceptions: vec!["Intranet.Example".to_string()],
            }),
            ..Default::default()
        };

        assert!(config.proxy_for("intranet.example").is_none());
        assert_eq!(
            config.proxy_for("example.com").map(|p| p.port),
            Some(3128)
        );
    }

    #[test]
    fn test_no_proxy_configured() {
        let config = FetchConfig::default();
        assert!(config.proxy_for("example.com").is_none());
    }
}
