//! Command-line options.
//!
//! `Opt` is generated by `clap` from the field attributes and converted into
//! the library `FetchConfig` by [`Opt::to_fetch_config`].

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_ACCEPT, DEFAULT_ACCEPT_CHARSET, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_MAX_CONTENT_LENGTH,
    DEFAULT_PAGE_LOAD_DELAY_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    TLS_HANDSHAKE_TIMEOUT_SECS,
};
use crate::config::types::{
    CaptureOptions, FetchConfig, LogFormat, LogLevel, ProxyConfig, RenderOptions, TlsPolicy,
};

/// Which fetch path the CLI should take.
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyChoice {
    /// Route by file extension (raw socket for listed extensions, renderer otherwise)
    Auto,
    /// Always use the raw socket
    Direct,
    /// Always use the rendering engine
    Render,
}

/// Command-line options and configuration.
///
/// # Examples
///
/// ```bash
/// # Fetch a PDF over the raw socket
/// rawfetch https://example.com/report.pdf --output report.pdf
///
/// # Through a proxy, keeping the verbatim request and response head
/// rawfetch http://example.com/data.pdf --proxy 10.0.0.1:3128 --capture-request --capture-headers
///
/// # Render HTML with a headless browser
/// rawfetch https://example.com/ --render-command chromium \
///     --render-arg=--headless --render-arg=--dump-dom --render-arg='{url}'
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "rawfetch",
    about = "Fetches one URL over a raw HTTP/1.0 socket or a rendering engine."
)]
pub struct Opt {
    /// URL to fetch
    #[arg(value_parser)]
    pub url: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Fetch path: auto|direct|render
    #[arg(long, value_enum, default_value_t = StrategyChoice::Auto)]
    pub strategy: StrategyChoice,

    /// Connect and read timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// TLS handshake timeout in seconds
    #[arg(long, default_value_t = TLS_HANDSHAKE_TIMEOUT_SECS)]
    pub tls_handshake_timeout_seconds: u64,

    /// Accept any server certificate without validation
    #[arg(long)]
    pub insecure: bool,

    /// Preferred TLS protocol versions (repeatable), e.g. TLSv1.3
    #[arg(long = "tls-protocol")]
    pub tls_protocols: Vec<String>,

    /// Preferred TLS cipher suites by IANA name (repeatable)
    #[arg(long = "tls-cipher")]
    pub tls_ciphers: Vec<String>,

    /// Forward proxy as host:port
    #[arg(long)]
    pub proxy: Option<String>,

    /// Hosts contacted directly even when a proxy is set (repeatable)
    #[arg(long = "no-proxy")]
    pub no_proxy: Vec<String>,

    /// Maximum body size in bytes, -1 for unbounded
    #[arg(long, default_value_t = DEFAULT_MAX_CONTENT_LENGTH as i64, allow_hyphen_values = true)]
    pub max_content_length: i64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Accept-Language header value (empty to omit)
    #[arg(long, default_value = DEFAULT_ACCEPT_LANGUAGE)]
    pub accept_language: String,

    /// Accept-Charset header value (empty to omit)
    #[arg(long, default_value = DEFAULT_ACCEPT_CHARSET)]
    pub accept_charset: String,

    /// Accept header value (empty to omit)
    #[arg(long, default_value = DEFAULT_ACCEPT)]
    pub accept: String,

    /// Cookie value from a previous fetch
    #[arg(long)]
    pub cookie: Option<String>,

    /// Last known modification time (RFC 3339 or RFC 2822)
    #[arg(long, value_parser = parse_timestamp)]
    pub if_modified_since: Option<DateTime<Utc>>,

    /// Never send the Cookie header
    #[arg(long)]
    pub disable_cookies: bool,

    /// Never send the If-Modified-Since header
    #[arg(long)]
    pub disable_if_modified_since: bool,

    /// Keep the request exactly as sent
    #[arg(long)]
    pub capture_request: bool,

    /// Keep the response head exactly as received
    #[arg(long)]
    pub capture_headers: bool,

    /// Record the IP address of the peer
    #[arg(long)]
    pub capture_ip: bool,

    /// File extensions fetched over the raw socket (repeatable)
    #[arg(long = "raw-ext", default_values_t = vec!["pdf".to_string()])]
    pub raw_file_extensions: Vec<String>,

    /// Program used to render pages that do not go over the raw socket
    #[arg(long)]
    pub render_command: Option<String>,

    /// Argument for the render program (repeatable); supports {url}, {user_agent},
    /// {settle_ms} and {screenshot} placeholders
    #[arg(long = "render-arg", allow_hyphen_values = true)]
    pub render_args: Vec<String>,

    /// Page-load timeout for the rendering engine in seconds
    #[arg(long, default_value_t = DEFAULT_PAGE_LOAD_DELAY_SECS)]
    pub page_load_seconds: u64,

    /// Settle delay after page load in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Directory for rendered-page screenshots
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    /// Write the body here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl Opt {
    /// Builds the library configuration from the parsed options.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy address is not `host:port` or the maximum
    /// content length is below `-1`.
    pub fn to_fetch_config(&self) -> Result<FetchConfig> {
        let defaults = TlsPolicy::default();
        let tls = TlsPolicy {
            verify_certificates: !self.insecure,
            preferred_protocols: if self.tls_protocols.is_empty() {
                defaults.preferred_protocols
            } else {
                self.tls_protocols.clone()
            },
            preferred_cipher_suites: if self.tls_ciphers.is_empty() {
                defaults.preferred_cipher_suites
            } else {
                self.tls_ciphers.clone()
            },
        };

        let proxy = self
            .proxy
            .as_deref()
            .map(|spec| parse_proxy(spec, &self.no_proxy))
            .transpose()?;

        let max_content_length = match self.max_content_length {
            -1 => None,
            n if n < -1 => bail!("Invalid --max-content-length {n} (use -1 for unbounded)"),
            n => Some(usize::try_from(n).context("--max-content-length does not fit in memory")?),
        };

        Ok(FetchConfig {
            timeout: Duration::from_secs(self.timeout_seconds),
            tls_handshake_timeout: Duration::from_secs(self.tls_handshake_timeout_seconds),
            tls,
            proxy,
            max_content_length,
            cookies_enabled: !self.disable_cookies,
            if_modified_since_enabled: !self.disable_if_modified_since,
            user_agent: self.user_agent.clone(),
            accept_language: non_empty(&self.accept_language),
            accept_charset: non_empty(&self.accept_charset),
            accept: non_empty(&self.accept),
            capture: CaptureOptions {
                request: self.capture_request,
                response_headers: self.capture_headers,
                ip_address: self.capture_ip,
            },
            raw_file_extensions: self.raw_file_extensions.clone(),
            render: RenderOptions {
                page_load_timeout: Duration::from_secs(self.page_load_seconds),
                settle_delay: self.settle_ms.map(Duration::from_millis),
                screenshot_dir: self.screenshot_dir.clone(),
            },
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_proxy(spec: &str, exceptions: &[String]) -> Result<ProxyConfig> {
    let (host, port) = spec
        .rsplit_once(':')
        .with_context(|| format!("Proxy must be host:port, got '{spec}'"))?;
    if host.is_empty() {
        bail!("Proxy host is empty in '{spec}'");
    }
    let port = port
        .parse::<u16>()
        .with_context(|| format!("Invalid proxy port in '{spec}'"))?;
    Ok(ProxyConfig {
        host: host.to_string(),
        port,
        exceptions: exceptions.to_vec(),
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 or RFC 2822 timestamp: {e}"))
}
