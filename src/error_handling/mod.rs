//! Error handling.
//!
//! This module provides:
//! - Error type definitions for fetching, TLS setup, rendering and initialization
//! - Error categorization and retriability
//!
//! Fetch errors fall into these categories:
//! - **Configuration**: unsupported scheme, unusable TLS preferences (fail before any I/O)
//! - **Connection** / **Timeout**: connect, handshake, proxy tunnel and socket failures
//! - **Protocol**: malformed status line, header without colon, truncated head
//! - **Content**: HTML on the raw-socket path, bad Content-Length, undecodable body
//! - **Render**: failures of the rendering collaborator

mod categorization;
mod types;

// Re-export public API
pub use types::{ErrorCategory, FetchError, InitializationError, Phase, RenderError, TlsError};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_category_has_a_description() {
        for category in ErrorCategory::iter() {
            assert!(!category.as_str().is_empty());
            assert_eq!(category.to_string(), category.as_str());
        }
    }

    #[test]
    fn test_error_messages() {
        let error = FetchError::UnsupportedScheme("ftp://example.com/file".into());
        assert_eq!(
            error.to_string(),
            "Unknown scheme (not http/https) for url: ftp://example.com/file"
        );

        let error = FetchError::MalformedStatusLine {
            line: "FOO BAR".into(),
        };
        assert_eq!(error.to_string(), "Bad status line 'FOO BAR'");
    }
}
