//! Response head parser.
//!
//! Reads the status line and header block from a [`WireReader`], tolerating
//! the ways real servers get HTTP/1.x wrong:
//!
//! - bare `\n` or bare `\r` line terminators
//! - folded (continued) header lines
//! - a status line without a reason phrase (`HTTP/1.1 200`)
//! - interim `100 Continue` heads before the real one
//! - a body that starts right after the last header, without the blank line
//!
//! The parser moves through `AwaitStatusLine -> AwaitHeaders -> Done`; an
//! interim `100` status sends it back to `AwaitStatusLine` with an empty
//! header map, at most [`MAX_INTERIM_RESPONSES`] times.

use log::{debug, warn};
use tokio::io::AsyncRead;

use crate::config::{
    MARKUP_MARKERS, MAX_HEADER_COUNT, MAX_HEAD_LINE_LENGTH, MAX_INTERIM_RESPONSES,
};
use crate::error_handling::FetchError;
use crate::http::headers::Headers;
use crate::http::reader::WireReader;
use crate::utils::sanitize::sanitize_and_truncate_line;

const STATUS_CONTINUE: u16 = 100;

/// A fully parsed response head.
#[derive(Debug)]
pub(crate) struct ResponseHead {
    pub(crate) status: u16,
    pub(crate) headers: Headers,
    /// Status line and header lines as received, when capture was requested
    pub(crate) raw: Option<String>,
}

enum ParseState {
    AwaitStatusLine,
    AwaitHeaders(u16),
    Done(u16),
}

/// Outcome of reading the header block.
enum HeaderBlock {
    /// Terminated by a blank (or whitespace-only) line
    Complete,
    /// Terminated by markup found inside a header line; the markup was pushed back
    BodyStarted,
}

/// Reads one response head, skipping interim `100` heads.
pub(crate) async fn read_response_head<R>(
    reader: &mut WireReader<R>,
    capture_raw: bool,
) -> Result<ResponseHead, FetchError>
where
    R: AsyncRead + Unpin,
{
    let mut headers = Headers::new();
    let mut raw = capture_raw.then(String::new);
    let mut interim = 0usize;
    let mut state = ParseState::AwaitStatusLine;

    loop {
        state = match state {
            ParseState::AwaitStatusLine => {
                let line = decode_line(read_line(reader, LineMode::Status).await?);
                if let Some(raw) = raw.as_mut() {
                    raw.push_str(&line);
                    raw.push('\n');
                }
                let status = parse_status_line(&line)?;
                debug!("Status line parsed: {status}");
                ParseState::AwaitHeaders(status)
            }
            ParseState::AwaitHeaders(status) => {
                let block = read_headers(reader, &mut headers, raw.as_mut()).await?;
                if status != STATUS_CONTINUE {
                    if matches!(block, HeaderBlock::BodyStarted) {
                        debug!("Response body started without a blank line after the headers");
                    }
                    ParseState::Done(status)
                } else {
                    interim += 1;
                    if interim > MAX_INTERIM_RESPONSES {
                        return Err(FetchError::TooManyInterimResponses(interim));
                    }
                    debug!("Interim 100 response #{interim}, reading the next status line");
                    headers.clear();
                    if let Some(raw) = raw.as_mut() {
                        raw.clear();
                    }
                    ParseState::AwaitStatusLine
                }
            }
            ParseState::Done(status) => {
                return Ok(ResponseHead {
                    status,
                    headers,
                    raw,
                })
            }
        };
    }
}

/// Reads header lines into `headers` until the end of the header block.
async fn read_headers<R>(
    reader: &mut WireReader<R>,
    headers: &mut Headers,
    mut raw: Option<&mut String>,
) -> Result<HeaderBlock, FetchError>
where
    R: AsyncRead + Unpin,
{
    let mut count = 0usize;
    loop {
        let line = read_line(reader, LineMode::Header).await?;
        if line.is_empty() {
            return Ok(HeaderBlock::Complete);
        }

        if let Some(pos) = find_markup(&line) {
            reader.unread(&line[pos..]);
            let text = decode_line(line[..pos].to_vec());
            if let Some(raw) = raw.as_mut() {
                raw.push_str(&text);
                raw.push('\n');
            }
            match parse_header_line(&text) {
                Ok(Some((key, value))) => headers.set(key, value),
                Ok(None) => {}
                Err(e) => warn!("Ignoring header fragment before markup: {e}"),
            }
            return Ok(HeaderBlock::BodyStarted);
        }

        let text = decode_line(line);
        if let Some(raw) = raw.as_mut() {
            raw.push_str(&text);
            raw.push('\n');
        }
        match parse_header_line(&text)? {
            Some((key, value)) => {
                count += 1;
                if count > MAX_HEADER_COUNT {
                    return Err(FetchError::TooManyHeaders(MAX_HEADER_COUNT));
                }
                headers.set(key, value);
            }
            None => return Ok(HeaderBlock::Complete),
        }
    }
}

/// How a physical line is read.
#[derive(Clone, Copy, PartialEq, Eq)]
enum LineMode {
    /// Status line: no folding, no markup detection
    Status,
    /// Header line: folding allowed, stops early once markup is seen
    Header,
}

/// Reads one line, without its terminator.
///
/// `\r\n`, bare `\n` and bare `\r` all terminate a line. In `Header` mode, a
/// non-empty line followed by a space or tab continues on the next physical
/// line (the fold is replaced by that single whitespace byte), and reading
/// stops as soon as the line ends with a markup marker so the body is never
/// scanned for a terminator. End of stream before a terminator is an error, and
/// so is a line longer than [`MAX_HEAD_LINE_LENGTH`].
async fn read_line<R>(reader: &mut WireReader<R>, mode: LineMode) -> Result<Vec<u8>, FetchError>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        if line.len() > MAX_HEAD_LINE_LENGTH {
            return Err(FetchError::HeadLineTooLong(MAX_HEAD_LINE_LENGTH));
        }
        let byte = reader.read_byte().await?.ok_or(FetchError::UnexpectedEof)?;
        match byte {
            b'\r' | b'\n' => {
                if byte == b'\r' && reader.peek_byte().await? == Some(b'\n') {
                    reader.read_byte().await?;
                }
                if mode == LineMode::Header && !line.is_empty() {
                    if let Some(fold @ (b' ' | b'\t')) = reader.peek_byte().await? {
                        reader.read_byte().await?;
                        line.push(fold);
                        continue;
                    }
                }
                return Ok(line);
            }
            other => {
                line.push(other);
                if mode == LineMode::Header && ends_with_markup(&line) {
                    return Ok(line);
                }
            }
        }
    }
}

/// Decodes a head line as UTF-8, falling back to ISO-8859-1 byte-for-char.
fn decode_line(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

/// Returns the offset of the earliest markup marker in `line`.
fn find_markup(line: &[u8]) -> Option<usize> {
    MARKUP_MARKERS
        .iter()
        .filter_map(|marker| {
            line.windows(marker.len())
                .position(|window| window == *marker)
        })
        .min()
}

fn ends_with_markup(line: &[u8]) -> bool {
    MARKUP_MARKERS.iter().any(|marker| line.ends_with(marker))
}

/// Parses the status code out of a status line.
///
/// The code is the token after the first space, ending at the next space or
/// at the end of the line (the reason phrase is optional).
pub(crate) fn parse_status_line(line: &str) -> Result<u16, FetchError> {
    let malformed = || FetchError::MalformedStatusLine {
        line: sanitize_and_truncate_line(line),
    };

    let (_, rest) = line.split_once(' ').ok_or_else(malformed)?;
    let code = rest.split(' ').next().unwrap_or_default();
    code.parse::<u16>().map_err(|_| malformed())
}

/// Splits a header line into key and value.
///
/// Returns `Ok(None)` for a line that is entirely whitespace. The value has its
/// leading spaces and tabs removed; the key is kept as received.
pub(crate) fn parse_header_line(line: &str) -> Result<Option<(String, String)>, FetchError> {
    let Some((key, value)) = line.split_once(':') else {
        if line.chars().all(char::is_whitespace) {
            return Ok(None);
        }
        return Err(FetchError::MissingColon {
            line: sanitize_and_truncate_line(line),
        });
    };
    let value = value.trim_start_matches([' ', '\t']);
    Ok(Some((key.to_string(), value.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(input: &[u8]) -> Result<(ResponseHead, Vec<u8>), FetchError> {
        let mut reader = WireReader::new(input, None);
        let head = read_response_head(&mut reader, true).await?;
        let mut rest = Vec::new();
        let mut chunk = [0u8; 64];
        loop {
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            rest.extend_from_slice(&chunk[..n]);
        }
        Ok((head, rest))
    }

    #[test]
    fn test_status_line_variants() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK").unwrap(), 200);
        assert_eq!(parse_status_line("HTTP/1.0 404 Not Found").unwrap(), 404);
        assert_eq!(parse_status_line("HTTP/1.1 204").unwrap(), 204);
    }

    #[test]
    fn test_malformed_status_line_is_fatal() {
        for line in ["FOO BAR", "HTTP/1.1", "", "HTTP/1.1  200", "HTTP/1.1 abc OK"] {
            assert!(
                matches!(
                    parse_status_line(line),
                    Err(FetchError::MalformedStatusLine { .. })
                ),
                "'{line}' should be rejected"
            );
        }
    }

    #[test]
    fn test_header_line_parsing() {
        assert_eq!(
            parse_header_line("Content-Type: \t text/plain").unwrap(),
            Some(("Content-Type".to_string(), "text/plain".to_string()))
        );
        assert_eq!(
            parse_header_line("X-Empty:").unwrap(),
            Some(("X-Empty".to_string(), String::new()))
        );
        assert_eq!(
            parse_header_line("Location: http://example.test:8080/").unwrap(),
            Some((
                "Location".to_string(),
                "http://example.test:8080/".to_string()
            ))
        );
        assert_eq!(parse_header_line(" \t ").unwrap(), None);
        assert!(matches!(
            parse_header_line("no colon here"),
            Err(FetchError::MissingColon { .. })
        ));
    }

    #[tokio::test]
    async fn test_simple_head() {
        let (head, rest) = parse(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();
        assert_eq!(head.status, 200);
        assert_eq!(head.headers.get("content-type"), Some("text/plain"));
        assert_eq!(head.headers.get("Content-Length"), Some("5"));
        assert_eq!(rest, b"hello");
        assert_eq!(
            head.raw.as_deref(),
            Some("HTTP/1.1 200 OK\nContent-Type: text/plain\nContent-Length: 5\n")
        );
    }

    #[tokio::test]
    async fn test_bare_lf_and_bare_cr_terminators() {
        let (head, rest) = parse(b"HTTP/1.0 200\nA: 1\rB: 2\n\nbody").await.unwrap();
        assert_eq!(head.status, 200);
        assert_eq!(head.headers.get("A"), Some("1"));
        assert_eq!(head.headers.get("B"), Some("2"));
        assert_eq!(rest, b"body");
    }

    #[tokio::test]
    async fn test_continuation_line_matches_unfolded_value() {
        let (folded, _) = parse(b"HTTP/1.1 200 OK\r\nX-Long: alpha\r\n beta\r\n\tgamma\r\nNext: 1\r\n\r\n")
            .await
            .unwrap();
        let (unfolded, _) = parse(b"HTTP/1.1 200 OK\r\nX-Long: alpha beta\tgamma\r\nNext: 1\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(folded.headers.get("X-Long"), Some("alpha beta\tgamma"));
        assert_eq!(folded.headers, unfolded.headers);
    }

    #[tokio::test]
    async fn test_interim_continue_is_discarded() {
        let input = b"HTTP/1.1 100 Continue\r\nX-Interim: yes\r\n\r\n\
                      HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\n\r\n%PDF";
        let (head, rest) = parse(input).await.unwrap();
        assert_eq!(head.status, 200);
        assert!(!head.headers.contains("X-Interim"));
        assert_eq!(head.headers.get("Content-Type"), Some("application/pdf"));
        assert_eq!(rest, b"%PDF");
        assert_eq!(
            head.raw.as_deref(),
            Some("HTTP/1.1 200 OK\nContent-Type: application/pdf\n")
        );
    }

    #[tokio::test]
    async fn test_interim_loop_is_bounded() {
        let mut input = Vec::new();
        for _ in 0..(MAX_INTERIM_RESPONSES + 1) {
            input.extend_from_slice(b"HTTP/1.1 100 Continue\r\n\r\n");
        }
        input.extend_from_slice(b"HTTP/1.1 200 OK\r\n\r\n");
        let result = parse(&input).await;
        assert!(matches!(
            result,
            Err(FetchError::TooManyInterimResponses(_))
        ));
    }

    #[tokio::test]
    async fn test_interim_within_cap_succeeds() {
        let mut input = Vec::new();
        for _ in 0..MAX_INTERIM_RESPONSES {
            input.extend_from_slice(b"HTTP/1.1 100 Continue\r\n\r\n");
        }
        input.extend_from_slice(b"HTTP/1.1 201 Created\r\n\r\n");
        let (head, _) = parse(&input).await.unwrap();
        assert_eq!(head.status, 201);
    }

    #[tokio::test]
    async fn test_missing_blank_line_before_markup() {
        let input = b"HTTP/1.1 200 OK\r\nServer: broken\r\nX-Last: value<html><body>hi</body></html>";
        let (head, rest) = parse(input).await.unwrap();
        assert_eq!(head.headers.get("Server"), Some("broken"));
        assert_eq!(head.headers.get("X-Last"), Some("value"));
        assert_eq!(rest, b"<html><body>hi</body></html>");
    }

    #[tokio::test]
    async fn test_markup_on_its_own_line() {
        let input = b"HTTP/1.0 200 OK\nContent-Type: text/html\n<!DOCTYPE html>\n<p>x</p>";
        let (head, rest) = parse(input).await.unwrap();
        assert_eq!(head.headers.len(), 1);
        assert_eq!(rest, b"<!DOCTYPE html>\n<p>x</p>");
    }

    #[tokio::test]
    async fn test_earliest_marker_wins() {
        let input = b"HTTP/1.0 200 OK\nX: a<HTML><!DOCTYPE\n";
        let (head, rest) = parse(input).await.unwrap();
        assert_eq!(head.headers.get("X"), Some("a"));
        assert_eq!(rest, b"<HTML><!DOCTYPE\n");
    }

    #[tokio::test]
    async fn test_garbage_before_markup_is_swallowed() {
        let input = b"HTTP/1.0 200 OK\nServer: x\ngarbage<html>page";
        let (head, rest) = parse(input).await.unwrap();
        assert_eq!(head.headers.len(), 1);
        assert_eq!(rest, b"<html>page");
    }

    #[tokio::test]
    async fn test_missing_colon_is_fatal() {
        let result = parse(b"HTTP/1.1 200 OK\r\nnot a header\r\n\r\n").await;
        assert!(matches!(result, Err(FetchError::MissingColon { .. })));
    }

    #[tokio::test]
    async fn test_eof_inside_head_is_fatal() {
        let result = parse(b"HTTP/1.1 200 OK\r\nServer: trunc").await;
        assert!(matches!(result, Err(FetchError::UnexpectedEof)));

        let result = parse(b"").await;
        assert!(matches!(result, Err(FetchError::UnexpectedEof)));
    }

    #[tokio::test]
    async fn test_malformed_status_from_stream() {
        let result = parse(b"FOO BAR\r\n\r\n").await;
        assert!(matches!(
            result,
            Err(FetchError::MalformedStatusLine { .. })
        ));
    }

    #[tokio::test]
    async fn test_whitespace_only_line_ends_headers() {
        let (head, rest) = parse(b"HTTP/1.1 200 OK\r\n \r\nbody").await.unwrap();
        assert!(head.headers.is_empty());
        assert_eq!(rest, b"body");
    }

    #[tokio::test]
    async fn test_header_count_cap() {
        let mut input = b"HTTP/1.1 200 OK\r\n".to_vec();
        for i in 0..=MAX_HEADER_COUNT {
            input.extend_from_slice(format!("X-{i}: v\r\n").as_bytes());
        }
        input.extend_from_slice(b"\r\n");
        let result = parse(&input).await;
        assert!(matches!(result, Err(FetchError::TooManyHeaders(_))));
    }

    #[tokio::test]
    async fn test_endless_header_line_is_rejected() {
        let mut input = b"HTTP/1.1 200 OK\r\nX-Endless: ".to_vec();
        input.extend(std::iter::repeat(b'a').take(MAX_HEAD_LINE_LENGTH + 10));
        input.extend_from_slice(b"\r\n\r\n");
        let result = parse(&input).await;
        assert!(matches!(result, Err(FetchError::HeadLineTooLong(_))));
    }

    #[tokio::test]
    async fn test_endless_folded_header_is_rejected() {
        let mut input = b"HTTP/1.1 200 OK\r\nX-Folded: a".to_vec();
        for _ in 0..(MAX_HEAD_LINE_LENGTH / 2 + 1) {
            input.extend_from_slice(b"\r\n a");
        }
        input.extend_from_slice(b"\r\n\r\n");
        let result = parse(&input).await;
        assert!(matches!(result, Err(FetchError::HeadLineTooLong(_))));
    }

    #[tokio::test]
    async fn test_endless_status_line_is_rejected() {
        let mut input = b"HTTP/1.1 200 ".to_vec();
        input.extend(std::iter::repeat(b'x').take(MAX_HEAD_LINE_LENGTH + 1));
        let result = parse(&input).await;
        assert!(matches!(result, Err(FetchError::HeadLineTooLong(_))));
    }

    #[tokio::test]
    async fn test_long_line_within_limit_is_kept() {
        let value = "v".repeat(MAX_HEAD_LINE_LENGTH - 8);
        let input = format!("HTTP/1.1 200 OK\r\nX-Long: {value}\r\n\r\n");
        let (head, _) = parse(input.as_bytes()).await.unwrap();
        assert_eq!(head.headers.get("X-Long"), Some(value.as_str()));
    }

    #[tokio::test]
    async fn test_latin1_header_value() {
        let (head, _) = parse(b"HTTP/1.1 200 OK\r\nX-Name: caf\xe9\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(head.headers.get("X-Name"), Some("café"));
    }
}
