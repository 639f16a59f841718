//! HTTP header name constants.
//!
//! Request headers are written with exactly this spelling; response headers are
//! looked up case-insensitively.

// Request headers, in the order they are written on the wire
/// Host header
pub const HEADER_HOST: &str = "Host";
/// Accept-Encoding header
pub const HEADER_ACCEPT_ENCODING: &str = "Accept-Encoding";
/// User-Agent header
pub const HEADER_USER_AGENT: &str = "User-Agent";
/// Accept-Language header
pub const HEADER_ACCEPT_LANGUAGE: &str = "Accept-Language";
/// Accept-Charset header
pub const HEADER_ACCEPT_CHARSET: &str = "Accept-Charset";
/// Accept header
pub const HEADER_ACCEPT: &str = "Accept";
/// Cookie header
pub const HEADER_COOKIE: &str = "Cookie";
/// If-Modified-Since header
pub const HEADER_IF_MODIFIED_SINCE: &str = "If-Modified-Since";

// Response headers consulted by the body reader
/// Content-Type header
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
/// Content-Length header
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
/// Content-Encoding header
pub const HEADER_CONTENT_ENCODING: &str = "Content-Encoding";

/// Markers that reveal a server skipped the blank line between head and body.
pub const MARKUP_MARKERS: &[&[u8]] = &[b"<!DOCTYPE", b"<HTML", b"<html"];
