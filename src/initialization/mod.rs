//! Process-wide setup for the binary and for library users that want it.
//!
//! - logger (`env_logger`, plain or JSON)
//! - default `rustls` crypto provider

mod logger;

use rustls::crypto::{ring::default_provider, CryptoProvider};

pub use logger::init_logger_with;

/// Installs the `ring` crypto provider as the process default for `rustls`.
///
/// Fetchers build their own provider from the TLS policy, so this only
/// matters for other `rustls` users in the process. Calling it twice is
/// harmless.
pub fn init_crypto_provider() {
    let _ = CryptoProvider::install_default(default_provider());
}
