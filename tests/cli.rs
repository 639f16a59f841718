//! Tests for the `rawfetch` binary: argument handling, output and exit codes.

use std::process::Command;

use tempfile::tempdir;

mod helpers;
use helpers::serve_once;

fn rawfetch() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rawfetch"))
}

#[test]
fn test_unsupported_scheme_exits_with_category() {
    let output = rawfetch()
        .args(["ftp://example.test/file.pdf", "--log-level", "error"])
        .output()
        .expect("failed to run rawfetch");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[configuration error]"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_invalid_max_content_length_is_rejected() {
    let output = rawfetch()
        .args(["http://example.test/a.pdf", "--max-content-length", "-5"])
        .output()
        .expect("failed to run rawfetch");
    assert!(!output.status.success());
}

#[test]
fn test_missing_url_is_a_usage_error() {
    let output = rawfetch().output().expect("failed to run rawfetch");
    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test]
async fn test_body_goes_to_stdout_and_head_to_stderr() {
    let server = serve_once("HTTP/1.0 200 OK\r\nContent-Length: 5\r\nX-Test: 1\r\n\r\nhello").await;
    let url = server.url("/greeting.pdf");

    let output = tokio::task::spawn_blocking(move || {
        rawfetch()
            .args([url.as_str(), "--log-level", "error"])
            .output()
            .expect("failed to run rawfetch")
    })
    .await
    .unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("X-Test: 1"), "unexpected stderr: {stderr}");
}

#[tokio::test]
async fn test_body_written_to_output_file() {
    let server = serve_once("HTTP/1.0 200 OK\r\nContent-Length: 4\r\n\r\n%PDF").await;
    let url = server.url("/doc.pdf");
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    let out = path.clone();

    let output = tokio::task::spawn_blocking(move || {
        rawfetch()
            .args([url.as_str(), "--log-level", "error", "--output"])
            .arg(&out)
            .output()
            .expect("failed to run rawfetch")
    })
    .await
    .unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
}
