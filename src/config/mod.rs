//! Fetcher configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, default header values)
//! - HTTP header name constants
//! - Library configuration types
//! - CLI option parsing

pub mod cli;
mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{
    CaptureOptions, FetchConfig, LogFormat, LogLevel, ProxyConfig, RenderOptions, TlsPolicy,
};
