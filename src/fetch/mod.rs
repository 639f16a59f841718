//! Fetch orchestration.
//!
//! A [`Fetcher`] owns the immutable configuration and the rendering
//! collaborator. Each call to [`Fetcher::fetch`] either:
//! - routes the URL through the rendering engine, or
//! - opens its own socket (optionally via a proxy, optionally upgraded to TLS),
//!   writes one HTTP/1.0 GET, parses the response head, reads the body and
//!   closes the socket again on every exit path.
//!
//! Nothing is shared between fetches except the configuration, so one
//! `Fetcher` can be used from any number of tasks.

mod connection;
mod render;
mod response;
mod strategy;
mod target;

use log::{debug, info};

use crate::config::{FetchConfig, HEADER_CONTENT_TYPE};
use crate::error_handling::{FetchError, TlsError};
use crate::http::body::read_body;
use crate::http::parser::read_response_head;
use crate::http::reader::WireReader;
use crate::http::{GetRequest, Headers};
use crate::tls::TlsNegotiator;

use connection::{connect, open_tunnel, write_all, Connection};
use target::{Scheme, Target};

pub use render::{CommandRenderer, NoRenderer, Renderer};
pub use response::{FetchRequest, Response};
pub use strategy::FetchStrategy;

const RENDERED_STATUS: u16 = 200;
const RENDERED_CONTENT_TYPE: &str = "text/html";

/// Fetches URLs over raw sockets or through a rendering engine.
#[derive(Debug)]
pub struct Fetcher<R = NoRenderer> {
    config: FetchConfig,
    tls: TlsNegotiator,
    renderer: R,
}

impl Fetcher<NoRenderer> {
    /// A fetcher without a rendering engine; only direct fetches succeed.
    ///
    /// # Errors
    ///
    /// See [`Fetcher::with_renderer`].
    pub fn new(config: FetchConfig) -> Result<Self, TlsError> {
        Self::with_renderer(config, NoRenderer)
    }
}

impl<R: Renderer> Fetcher<R> {
    /// Builds a fetcher that hands non-raw URLs to `renderer`.
    ///
    /// # Errors
    ///
    /// Returns a `TlsError` when the TLS preference lists leave nothing to
    /// negotiate with. No network I/O happens here.
    pub fn with_renderer(config: FetchConfig, renderer: R) -> Result<Self, TlsError> {
        let tls = TlsNegotiator::new(&config.tls)?;
        Ok(Self {
            config,
            tls,
            renderer,
        })
    }

    /// The configuration this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `request`, choosing the strategy from the URL's file extension.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Response, FetchError> {
        let strategy = FetchStrategy::select(request.url(), &self.config.raw_file_extensions);
        self.fetch_with_strategy(request, strategy).await
    }

    /// Fetches `request` with an explicit strategy.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`]; use [`FetchError::category`] to tell configuration,
    /// connection, protocol, content and render failures apart.
    pub async fn fetch_with_strategy(
        &self,
        request: &FetchRequest,
        strategy: FetchStrategy,
    ) -> Result<Response, FetchError> {
        let url = request.url();
        let target = Target::parse(url)?;
        info!("Fetching {url} ({strategy})");

        match strategy {
            FetchStrategy::Direct => self.fetch_direct(request, &target).await,
            FetchStrategy::Render => self.fetch_rendered(request).await,
        }
    }

    async fn fetch_rendered(&self, request: &FetchRequest) -> Result<Response, FetchError> {
        let html = self
            .renderer
            .render(request.url(), &self.config.user_agent, &self.config.render)
            .await?;

        let mut body = html.into_bytes();
        if let Some(max) = self.config.max_content_length {
            body.truncate(max);
        }

        let mut headers = Headers::new();
        headers.set(HEADER_CONTENT_TYPE, RENDERED_CONTENT_TYPE);
        Ok(Response::new(
            request.url().clone(),
            RENDERED_STATUS,
            headers,
            body,
            FetchStrategy::Render,
        ))
    }

    async fn fetch_direct(
        &self,
        request: &FetchRequest,
        target: &Target,
    ) -> Result<Response, FetchError> {
        let timeout = self.config.timeout;
        let proxy = self.config.proxy_for(&target.connect_host);
        let mut stream = match proxy {
            Some(proxy) => connect(&proxy.host, proxy.port, timeout).await?,
            None => connect(&target.connect_host, target.port, timeout).await?,
        };

        let peer_ip = if self.config.capture.ip_address {
            stream.peer_addr().ok().map(|addr| addr.ip())
        } else {
            None
        };

        let (mut connection, tls) = match target.scheme {
            Scheme::Http => (Connection::Plain(stream), None),
            Scheme::Https => {
                if proxy.is_some() {
                    open_tunnel(&mut stream, target, timeout).await?;
                }
                let (stream, summary) = self
                    .tls
                    .upgrade(stream, &target.connect_host, self.config.tls_handshake_timeout)
                    .await?;
                (Connection::Tls(Box::new(stream)), Some(summary))
            }
        };

        // Only plain HTTP through a proxy uses the absolute form; a tunnel
        // behaves like a direct connection.
        let absolute_form = proxy.is_some() && target.scheme == Scheme::Http;
        let result = self
            .exchange(&mut connection, request, target, absolute_form)
            .await;
        connection.close().await;

        let exchanged = result?;
        debug!(
            "{} answered {} with {} body bytes",
            request.url(),
            exchanged.status,
            exchanged.body.len()
        );

        Ok(Response::new(
            request.url().clone(),
            exchanged.status,
            exchanged.headers,
            exchanged.body,
            FetchStrategy::Direct,
        )
        .with_capture(exchanged.raw_request, exchanged.raw_head, peer_ip)
        .with_tls(tls))
    }

    /// Writes the request and reads the full response on an open connection.
    async fn exchange(
        &self,
        connection: &mut Connection,
        request: &FetchRequest,
        target: &Target,
        absolute_form: bool,
    ) -> Result<Exchanged, FetchError> {
        let config = &self.config;
        let request_target = if absolute_form {
            target.absolute_uri()
        } else {
            target.path.clone()
        };
        let host = target.host_header();

        let get = GetRequest {
            target: &request_target,
            host: &host,
            user_agent: &config.user_agent,
            accept_language: config.accept_language.as_deref(),
            accept_charset: config.accept_charset.as_deref(),
            accept: config.accept.as_deref(),
            cookie: request.cookie().filter(|_| config.cookies_enabled),
            if_modified_since: request
                .modified_time()
                .filter(|_| config.if_modified_since_enabled),
        };
        let serialized = get.serialize();
        write_all(connection, serialized.as_bytes(), config.timeout).await?;

        let mut reader = WireReader::new(connection, Some(config.timeout));
        let head = read_response_head(&mut reader, config.capture.response_headers).await?;
        debug!("Status {} from {}", head.status, target.authority());
        let body = read_body(
            &mut reader,
            head.status,
            &head.headers,
            config.max_content_length,
        )
        .await?;

        Ok(Exchanged {
            status: head.status,
            headers: head.headers,
            body,
            raw_head: head.raw,
            raw_request: config.capture.request.then_some(serialized),
        })
    }
}

/// What one request/response exchange produced.
struct Exchanged {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
    raw_head: Option<String>,
    raw_request: Option<String>,
}
