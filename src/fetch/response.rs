//! Fetch inputs and outputs.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use url::Url;

use crate::error_handling::FetchError;
use crate::fetch::strategy::FetchStrategy;
use crate::http::Headers;
use crate::tls::TlsSummary;

/// One URL to fetch, plus what the caller already knows about it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: Url,
    cookie: Option<String>,
    modified_time: Option<DateTime<Utc>>,
}

impl FetchRequest {
    /// A request for `url` with no previously-seen state.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cookie: None,
            modified_time: None,
        }
    }

    /// Parses `url` into a request.
    ///
    /// # Errors
    ///
    /// `FetchError::InvalidUrl` if `url` is not an absolute URL.
    pub fn parse(url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "not an absolute URL",
        })?;
        Ok(Self::new(url))
    }

    /// Cookie value remembered from an earlier visit.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Last-Modified time remembered from an earlier visit.
    pub fn with_modified_time(mut self, modified_time: DateTime<Utc>) -> Self {
        self.modified_time = Some(modified_time);
        self
    }

    /// The URL to fetch.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The remembered cookie, if any.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// The remembered modification time, if any.
    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.modified_time
    }
}

/// The outcome of a successful fetch. Immutable once built.
#[derive(Debug, Clone)]
pub struct Response {
    url: Url,
    status: u16,
    headers: Headers,
    body: Vec<u8>,
    strategy: FetchStrategy,
    fetch_time: DateTime<Utc>,
    raw_request: Option<String>,
    raw_headers: Option<String>,
    peer_ip: Option<IpAddr>,
    tls: Option<TlsSummary>,
}

impl Response {
    pub(crate) fn new(
        url: Url,
        status: u16,
        headers: Headers,
        body: Vec<u8>,
        strategy: FetchStrategy,
    ) -> Self {
        Self {
            url,
            status,
            headers,
            body,
            strategy,
            fetch_time: Utc::now(),
            raw_request: None,
            raw_headers: None,
            peer_ip: None,
            tls: None,
        }
    }

    pub(crate) fn with_capture(
        mut self,
        raw_request: Option<String>,
        raw_headers: Option<String>,
        peer_ip: Option<IpAddr>,
    ) -> Self {
        self.raw_request = raw_request;
        self.raw_headers = raw_headers;
        self.peer_ip = peer_ip;
        self
    }

    pub(crate) fn with_tls(mut self, tls: Option<TlsSummary>) -> Self {
        self.tls = tls;
        self
    }

    /// The URL that was fetched.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Final (non-interim) status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers in arrival order.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of header `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Decoded body, possibly truncated at the content-length cap.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Takes the body out of the response.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Which path produced this response.
    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }

    /// When the response was completed.
    pub fn fetch_time(&self) -> DateTime<Utc> {
        self.fetch_time
    }

    /// The request exactly as written to the socket, when request capture is on.
    pub fn raw_request(&self) -> Option<&str> {
        self.raw_request.as_deref()
    }

    /// Status line and header lines as received, when header capture is on.
    pub fn raw_headers(&self) -> Option<&str> {
        self.raw_headers.as_deref()
    }

    /// Address of the socket peer (the proxy, when one was used), when IP capture is on.
    pub fn peer_ip(&self) -> Option<IpAddr> {
        self.peer_ip
    }

    /// Negotiated TLS parameters, for HTTPS fetches.
    pub fn tls(&self) -> Option<&TlsSummary> {
        self.tls.as_ref()
    }
}
