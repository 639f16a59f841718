//! Peer certificate extraction.

use log::debug;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::certificate::X509Certificate;

/// Subject, issuer and DNS names of the server's end-entity certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerCertificate {
    /// Subject distinguished name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// DNS names from the Subject Alternative Name extension
    pub subject_alternative_names: Vec<String>,
}

/// Parses a DER certificate. Returns `None` (and logs) if it cannot be parsed.
pub(crate) fn extract_peer_certificate(der: &[u8]) -> Option<PeerCertificate> {
    let cert = match x509_parser::parse_x509_certificate(der) {
        Ok((_, cert)) => cert,
        Err(e) => {
            debug!("Could not parse peer certificate: {e}");
            return None;
        }
    };

    Some(PeerCertificate {
        subject: cert.tbs_certificate.subject.to_string(),
        issuer: cert.tbs_certificate.issuer.to_string(),
        subject_alternative_names: extract_certificate_sans(&cert),
    })
}

/// DNS names from the SAN extension; other name kinds are skipped.
fn extract_certificate_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                if let GeneralName::DNSName(dns_name) = name {
                    sans.push(dns_name.to_string());
                }
            }
        }
    }
    sans
}
