//! Error categorization.
//!
//! Maps each `FetchError` onto an `ErrorCategory` and decides retriability.

use std::io;

use super::types::{ErrorCategory, FetchError};

impl FetchError {
    /// Returns the broad category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FetchError::UnsupportedScheme(_)
            | FetchError::InvalidUrl { .. }
            | FetchError::Tls(_) => ErrorCategory::Configuration,
            FetchError::Timeout { .. } => ErrorCategory::Timeout,
            FetchError::Io(e) if e.kind() == io::ErrorKind::TimedOut => ErrorCategory::Timeout,
            FetchError::Connect { .. }
            | FetchError::Handshake { .. }
            | FetchError::ProxyTunnel { .. }
            | FetchError::Io(_) => ErrorCategory::Connection,
            FetchError::MalformedStatusLine { .. }
            | FetchError::MissingColon { .. }
            | FetchError::UnexpectedEof
            | FetchError::TooManyInterimResponses(_)
            | FetchError::TooManyHeaders(_)
            | FetchError::HeadLineTooLong(_) => ErrorCategory::Protocol,
            FetchError::HtmlContent(_)
            | FetchError::BadContentLength(_)
            | FetchError::Decompression { .. } => ErrorCategory::Content,
            FetchError::Render(_) => ErrorCategory::Render,
        }
    }

    /// Returns `true` if fetching the same URL again later may succeed.
    ///
    /// Timeouts, connection failures and rendering failures are transient;
    /// configuration, protocol and content errors will repeat on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Timeout | ErrorCategory::Connection | ErrorCategory::Render
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error_handling::{Phase, RenderError, TlsError};

    #[test]
    fn test_configuration_errors_are_not_retryable() {
        let errors = [
            FetchError::UnsupportedScheme("ftp://example.com/".into()),
            FetchError::Tls(TlsError::NoProtocols {
                preferred: vec!["SSLv3".into()],
            }),
        ];
        for error in errors {
            assert_eq!(error.category(), ErrorCategory::Configuration);
            assert!(!error.is_retryable(), "{error} should not be retryable");
        }
    }

    #[test]
    fn test_timeouts_are_retryable() {
        let error = FetchError::Timeout {
            phase: Phase::Read,
            limit: Duration::from_secs(10),
        };
        assert_eq!(error.category(), ErrorCategory::Timeout);
        assert!(error.is_retryable());

        let io_timeout = FetchError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert_eq!(io_timeout.category(), ErrorCategory::Timeout);
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        let error = FetchError::Connect {
            addr: "example.com:80".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(error.category(), ErrorCategory::Connection);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_protocol_and_content_errors_are_final() {
        let errors = [
            FetchError::MalformedStatusLine {
                line: "FOO BAR".into(),
            },
            FetchError::MissingColon {
                line: "garbage".into(),
            },
            FetchError::UnexpectedEof,
            FetchError::HeadLineTooLong(16_384),
            FetchError::BadContentLength("abc".into()),
            FetchError::HtmlContent("text/html".into()),
        ];
        for error in errors {
            assert!(!error.is_retryable(), "{error} should not be retryable");
        }
    }

    #[test]
    fn test_render_errors_are_retryable() {
        let error = FetchError::from(RenderError::Timeout(Duration::from_secs(3)));
        assert_eq!(error.category(), ErrorCategory::Render);
        assert!(error.is_retryable());
    }
}
