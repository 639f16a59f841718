//! rawfetch library: single-resource fetching over raw sockets
//!
//! This library fetches one web resource per call. Binary documents (PDFs and
//! the like) are fetched with a hand-built HTTP/1.0 client over plain TCP or
//! TLS, while pages that need script execution are handed to a rendering
//! engine. Each fetch owns its socket from connect to close and returns either
//! a [`Response`] or a typed [`FetchError`].
//!
//! # Example
//!
//! ```no_run
//! use rawfetch::{FetchConfig, FetchRequest, Fetcher};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(FetchConfig::default())?;
//! let request = FetchRequest::parse("https://example.com/report.pdf")?;
//!
//! let response = fetcher.fetch(&request).await?;
//! println!("{} ({} bytes)", response.status(), response.body().len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
mod error_handling;
mod fetch;
pub mod http;
pub mod initialization;
mod tls;
mod utils;

// Re-export public API
pub use config::{
    CaptureOptions, FetchConfig, LogFormat, LogLevel, ProxyConfig, RenderOptions, TlsPolicy,
};
pub use error_handling::{
    ErrorCategory, FetchError, InitializationError, Phase, RenderError, TlsError,
};
pub use fetch::{
    CommandRenderer, FetchRequest, FetchStrategy, Fetcher, NoRenderer, Renderer, Response,
};
pub use http::Headers;
pub use tls::{CertificateVerification, PeerCertificate, TlsNegotiator, TlsSummary};
