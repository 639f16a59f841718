//! TLS negotiation for the raw-socket fetcher.
//!
//! A [`TlsNegotiator`] is built once per fetcher from a [`TlsPolicy`]:
//! - the preferred protocol versions and cipher suites are intersected with
//!   what the local `rustls` build implements
//! - an empty intersection is rejected before anything touches the network
//! - certificate verification is either strict (webpki roots) or switched off
//!
//! Uses `tokio-rustls` for the handshake and `x509-parser` to summarize the
//! peer certificate.

mod extract;
mod verifier;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore, SupportedCipherSuite, SupportedProtocolVersion};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::config::TlsPolicy;
use crate::error_handling::{FetchError, Phase, TlsError};

pub use extract::PeerCertificate;
use extract::extract_peer_certificate;
use verifier::AcceptAnyVerifier;

/// How the server certificate chain is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateVerification {
    /// Chain must lead to a bundled webpki root and match the host name
    Strict,
    /// Any certificate is accepted
    AcceptAny,
}

/// What was negotiated on a TLS connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSummary {
    /// Protocol version, e.g. `TLSv1_3`
    pub protocol: String,
    /// Cipher suite, e.g. `TLS13_AES_128_GCM_SHA256`
    pub cipher_suite: String,
    /// End-entity certificate, when the server sent a parseable one
    pub peer_certificate: Option<PeerCertificate>,
}

/// Client TLS configuration derived from a [`TlsPolicy`].
#[derive(Clone)]
pub struct TlsNegotiator {
    config: Arc<ClientConfig>,
    verification: CertificateVerification,
    protocols: Vec<String>,
    cipher_suites: Vec<String>,
}

impl std::fmt::Debug for TlsNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsNegotiator")
            .field("verification", &self.verification)
            .field("protocols", &self.protocols)
            .field("cipher_suites", &self.cipher_suites)
            .finish()
    }
}

impl TlsNegotiator {
    /// Builds the client configuration.
    ///
    /// # Errors
    ///
    /// - `TlsError::NoProtocols` if no preferred protocol is implemented locally
    /// - `TlsError::NoCipherSuites` if no preferred cipher suite is implemented locally
    /// - `TlsError::Config` if the enabled protocols and suites cannot be combined
    ///   (for example only TLS 1.3 suites with only TLS 1.2 enabled)
    pub fn new(policy: &TlsPolicy) -> Result<Self, TlsError> {
        let versions = enabled_protocols(&policy.preferred_protocols);
        if versions.is_empty() {
            return Err(TlsError::NoProtocols {
                preferred: policy.preferred_protocols.clone(),
            });
        }

        let base = ring::default_provider();
        let cipher_suites = enabled_cipher_suites(&base.cipher_suites, &policy.preferred_cipher_suites);
        if cipher_suites.is_empty() {
            return Err(TlsError::NoCipherSuites {
                preferred: policy.preferred_cipher_suites.clone(),
            });
        }

        let protocols: Vec<String> = versions.iter().map(|v| protocol_name(v)).collect();
        let suite_names: Vec<String> = cipher_suites.iter().map(|s| suite_name(s)).collect();
        debug!("Enabled TLS protocols {protocols:?}, cipher suites {suite_names:?}");

        let provider = Arc::new(CryptoProvider {
            cipher_suites,
            ..base
        });
        let algorithms = provider.signature_verification_algorithms;
        let builder = ClientConfig::builder_with_provider(provider).with_protocol_versions(&versions)?;

        let verification = if policy.verify_certificates {
            CertificateVerification::Strict
        } else {
            CertificateVerification::AcceptAny
        };
        let config = match verification {
            CertificateVerification::Strict => {
                let mut roots = RootCertStore::empty();
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                builder.with_root_certificates(roots).with_no_client_auth()
            }
            CertificateVerification::AcceptAny => {
                info!("TLS certificate verification is disabled");
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(AcceptAnyVerifier::new(algorithms)))
                    .with_no_client_auth()
            }
        };

        Ok(Self {
            config: Arc::new(config),
            verification,
            protocols,
            cipher_suites: suite_names,
        })
    }

    /// Enabled protocol versions, most preferred first.
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// Enabled cipher suites, most preferred first.
    pub fn cipher_suites(&self) -> &[String] {
        &self.cipher_suites
    }

    /// How certificates are checked.
    pub fn verification(&self) -> CertificateVerification {
        self.verification
    }

    /// Runs the client handshake over `stream`, naming `host` for SNI and
    /// certificate matching.
    ///
    /// # Errors
    ///
    /// `TlsError::InvalidServerName` for hosts that cannot be a server name,
    /// `FetchError::Timeout` once `timeout` expires, `FetchError::Handshake`
    /// for every other handshake failure.
    pub async fn upgrade(
        &self,
        stream: TcpStream,
        host: &str,
        timeout: Duration,
    ) -> Result<(TlsStream<TcpStream>, TlsSummary), FetchError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| TlsError::InvalidServerName(host.to_string()))?;

        let connector = TlsConnector::from(Arc::clone(&self.config));
        let stream = tokio::time::timeout(timeout, connector.connect(server_name, stream))
            .await
            .map_err(|_| FetchError::Timeout {
                phase: Phase::TlsHandshake,
                limit: timeout,
            })?
            .map_err(|source| FetchError::Handshake {
                host: host.to_string(),
                source,
            })?;

        let connection = stream.get_ref().1;
        let summary = TlsSummary {
            protocol: connection
                .protocol_version()
                .map(|v| format!("{v:?}"))
                .unwrap_or_else(|| "Unknown".to_string()),
            cipher_suite: connection
                .negotiated_cipher_suite()
                .map(|s| format!("{:?}", s.suite()))
                .unwrap_or_else(|| "Unknown".to_string()),
            peer_certificate: connection
                .peer_certificates()
                .and_then(|certs| certs.first())
                .and_then(|cert| extract_peer_certificate(cert.as_ref())),
        };
        debug!(
            "TLS with {host}: {} using {}",
            summary.protocol, summary.cipher_suite
        );
        Ok((stream, summary))
    }
}

/// Maps preferred protocol names onto the versions `rustls` implements,
/// keeping preference order and dropping duplicates.
fn enabled_protocols(preferred: &[String]) -> Vec<&'static SupportedProtocolVersion> {
    let mut enabled: Vec<&'static SupportedProtocolVersion> = Vec::new();
    for name in preferred {
        let found = rustls::ALL_VERSIONS
            .iter()
            .copied()
            .find(|v| protocol_aliases(v).iter().any(|a| a.eq_ignore_ascii_case(name.trim())));
        match found {
            Some(version) if !enabled.iter().any(|e| e.version == version.version) => {
                enabled.push(version)
            }
            Some(_) => {}
            None => debug!("TLS protocol {name} is not available"),
        }
    }
    enabled
}

fn protocol_aliases(version: &SupportedProtocolVersion) -> &'static [&'static str] {
    match version.version {
        rustls::ProtocolVersion::TLSv1_3 => &["TLSv1.3", "TLSv1_3", "TLS1.3"],
        rustls::ProtocolVersion::TLSv1_2 => &["TLSv1.2", "TLSv1_2", "TLS1.2"],
        _ => &[],
    }
}

fn protocol_name(version: &SupportedProtocolVersion) -> String {
    protocol_aliases(version)
        .first()
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("{:?}", version.version))
}

/// Keeps the suites of `available` named in `preferred`, in preference order.
fn enabled_cipher_suites(
    available: &[SupportedCipherSuite],
    preferred: &[String],
) -> Vec<SupportedCipherSuite> {
    let mut enabled: Vec<SupportedCipherSuite> = Vec::new();
    for name in preferred {
        let wanted = normalize_suite_name(name);
        let found = available
            .iter()
            .find(|suite| normalize_suite_name(&suite_name(suite)) == wanted);
        match found {
            Some(suite) if !enabled.iter().any(|e| e.suite() == suite.suite()) => {
                enabled.push(*suite)
            }
            Some(_) => {}
            None => debug!("TLS cipher suite {name} is not available"),
        }
    }
    enabled
}

fn suite_name(suite: &SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

/// `rustls` spells TLS 1.3 suites `TLS13_*`; IANA spells them `TLS_*`.
fn normalize_suite_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    match upper.strip_prefix("TLS13_") {
        Some(rest) => format!("TLS_{rest}"),
        None => upper,
    }
}
