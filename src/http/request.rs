//! GET request serialization.
//!
//! The request is HTTP/1.0 with a fixed header order:
//! Host, Accept-Encoding, User-Agent, Accept-Language, Accept-Charset, Accept,
//! Cookie, If-Modified-Since, then the blank line.

use chrono::{DateTime, Utc};
use log::warn;

use crate::config::{
    ACCEPT_ENCODING, HEADER_ACCEPT, HEADER_ACCEPT_CHARSET, HEADER_ACCEPT_ENCODING,
    HEADER_ACCEPT_LANGUAGE, HEADER_COOKIE, HEADER_HOST, HEADER_IF_MODIFIED_SINCE,
    HEADER_USER_AGENT,
};

/// Formats a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn format_http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// A GET request ready to be serialized.
///
/// Optional headers are omitted when their value is `None` (or blank, for the
/// user agent). Whether cookies and `If-Modified-Since` are enabled is decided
/// by the caller before filling `cookie` / `if_modified_since`.
#[derive(Debug, Clone, Default)]
pub struct GetRequest<'a> {
    /// Request target: origin-form path or absolute URI
    pub target: &'a str,
    /// Host header value, including `:port` when the URL named one
    pub host: &'a str,
    /// User-Agent value; omitted when blank
    pub user_agent: &'a str,
    /// Accept-Language value
    pub accept_language: Option<&'a str>,
    /// Accept-Charset value
    pub accept_charset: Option<&'a str>,
    /// Accept value
    pub accept: Option<&'a str>,
    /// Cookie value
    pub cookie: Option<&'a str>,
    /// Sent as an HTTP date in If-Modified-Since
    pub if_modified_since: Option<DateTime<Utc>>,
}

impl GetRequest<'_> {
    /// Serializes the request exactly as it is written to the socket.
    pub fn serialize(&self) -> String {
        let target = if self.target.is_empty() { "/" } else { self.target };
        let mut request = format!("GET {target} HTTP/1.0\r\n");

        push_header(&mut request, HEADER_HOST, self.host);
        push_header(&mut request, HEADER_ACCEPT_ENCODING, ACCEPT_ENCODING);

        if self.user_agent.trim().is_empty() {
            warn!("User-agent is not set, sending request without one");
        } else {
            push_header(&mut request, HEADER_USER_AGENT, self.user_agent);
        }

        let optional = [
            (HEADER_ACCEPT_LANGUAGE, self.accept_language),
            (HEADER_ACCEPT_CHARSET, self.accept_charset),
            (HEADER_ACCEPT, self.accept),
            (HEADER_COOKIE, self.cookie),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                push_header(&mut request, name, value);
            }
        }

        if let Some(modified) = &self.if_modified_since {
            push_header(&mut request, HEADER_IF_MODIFIED_SINCE, &format_http_date(modified));
        }

        request.push_str("\r\n");
        request
    }
}

fn push_header(request: &mut String, name: &str, value: &str) {
    request.push_str(name);
    request.push_str(": ");
    request.push_str(value);
    request.push_str("\r\n");
}
