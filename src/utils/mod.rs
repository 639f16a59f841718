//! Utility functions shared by the fetch path.
//!
//! This module provides:
//! - Deadline wrapping for socket operations
//! - Sanitization of wire text embedded in errors and logs

pub mod sanitize;
mod timing;

pub use timing::with_timeout;
