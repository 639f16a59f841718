//! HTTP/1.0 wire handling: request serialization, head parsing, body reading.

pub mod body;
mod headers;
pub(crate) mod parser;
pub(crate) mod reader;
mod request;

pub use body::{decode_body, is_html_content_type, ContentEncoding};
pub use headers::Headers;
pub use request::{format_http_date, GetRequest};
