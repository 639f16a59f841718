//! Utilities for sanitizing wire text before it reaches errors and logs.
//!
//! Response lines come straight off an untrusted socket; control characters
//! and unbounded lengths are stripped before they are embedded in messages.

/// Maximum length of a response line embedded in an error or log message.
pub const MAX_REPORTED_LINE_LENGTH: usize = 200;

/// Removes control characters from a line of wire text.
///
/// Tabs are kept; every other character below 0x20 (and DEL) is dropped.
pub fn sanitize_line(line: &str) -> String {
    line.chars()
        .filter(|c| *c == '\t' || !c.is_control())
        .collect()
}

/// Sanitizes and truncates a line of wire text for reporting.
///
/// # Arguments
///
/// * `line` - The line as received from the server
///
/// # Returns
///
/// The sanitized line, cut at `MAX_REPORTED_LINE_LENGTH` characters with a
/// note about the original length when it was longer.
pub fn sanitize_and_truncate_line(line: &str) -> String {
    let sanitized = sanitize_line(line);
    let length = sanitized.chars().count();

    if length > MAX_REPORTED_LINE_LENGTH {
        let kept: String = sanitized.chars().take(MAX_REPORTED_LINE_LENGTH).collect();
        format!("{kept}... (truncated, original length: {length} chars)")
    } else {
        sanitized
    }
}

/// Turns a URL into a file-name-safe stem (for screenshots).
///
/// Every character outside `[A-Za-z0-9.-]` becomes `_`, and runs of `_` collapse.
pub fn file_stem_for_url(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let mut stem = String::with_capacity(without_scheme.len());
    for c in without_scheme.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };
        if !(c == '_' && stem.ends_with('_')) {
            stem.push(c);
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "page".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_line_removes_control_chars() {
        let input = "HTTP/1.1\x00 200\x1b[31m OK";
        assert_eq!(sanitize_line(input), "HTTP/1.1 200[31m OK");
    }

    #[test]
    fn test_sanitize_line_keeps_tabs_and_unicode() {
        assert_eq!(sanitize_line("X-Name:\tcafé"), "X-Name:\tcafé");
    }

    #[test]
    fn test_truncates_long_lines() {
        let input = "a".repeat(500);
        let output = sanitize_and_truncate_line(&input);
        assert!(output.starts_with(&"a".repeat(MAX_REPORTED_LINE_LENGTH)));
        assert!(output.ends_with("(truncated, original length: 500 chars)"));
    }

    #[test]
    fn test_short_lines_untouched() {
        assert_eq!(sanitize_and_truncate_line("FOO BAR"), "FOO BAR");
    }

    #[test]
    fn test_file_stem_for_url() {
        assert_eq!(
            file_stem_for_url("https://example.com/a/b?q=1"),
            "example.com_a_b_q_1"
        );
        assert_eq!(file_stem_for_url("http:///"), "page");
    }
}
