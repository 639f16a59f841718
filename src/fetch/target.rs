//! Where a URL points on the wire.

use url::{Host, Url};

use crate::error_handling::FetchError;

/// Schemes the fetcher speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// A validated fetch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) scheme: Scheme,
    /// Host as written in URLs and the `Host` header (IPv6 in brackets)
    pub(crate) host: String,
    /// Host as handed to the resolver and to TLS (IPv6 without brackets)
    pub(crate) connect_host: String,
    pub(crate) port: u16,
    /// The URL named its port explicitly
    explicit_port: bool,
    /// Path plus query, never empty
    pub(crate) path: String,
}

impl Target {
    /// Validates `url` and splits it into connection coordinates.
    ///
    /// # Errors
    ///
    /// `FetchError::UnsupportedScheme` for anything but `http`/`https`,
    /// `FetchError::InvalidUrl` when there is no host.
    pub(crate) fn parse(url: &Url) -> Result<Self, FetchError> {
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => return Err(FetchError::UnsupportedScheme(url.to_string())),
        };

        let (host, connect_host) = match url.host() {
            Some(Host::Ipv6(addr)) => (format!("[{addr}]"), addr.to_string()),
            Some(Host::Ipv4(addr)) => (addr.to_string(), addr.to_string()),
            Some(Host::Domain(domain)) if !domain.is_empty() => {
                (domain.to_string(), domain.to_string())
            }
            _ => {
                return Err(FetchError::InvalidUrl {
                    url: url.to_string(),
                    reason: "no host",
                })
            }
        };

        let mut path = url.path().to_string();
        if path.is_empty() {
            path.push('/');
        }
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            scheme,
            host,
            connect_host,
            port: url.port().unwrap_or(scheme.default_port()),
            explicit_port: url.port().is_some(),
            path,
        })
    }

    /// `Host` header value; carries the port only when the URL named one.
    pub(crate) fn host_header(&self) -> String {
        if self.explicit_port {
            format!("{}:{}", self.host, self.port)
        } else {
            self.host.clone()
        }
    }

    /// Absolute-form request target, used when talking to a forward proxy.
    pub(crate) fn absolute_uri(&self) -> String {
        format!("{}://{}{}", self.scheme.as_str(), self.host_header(), self.path)
    }

    /// `host:port` as used in `CONNECT` and error messages.
    pub(crate) fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
