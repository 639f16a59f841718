// Shared test helpers: canned HTTP servers on loopback sockets.
//
// Each server accepts exactly one connection, records the request head it
// receives, replies with fixed bytes and closes the socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::rustls::pki_types::pem::PemObject;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use rawfetch::FetchConfig;

/// Self-signed certificate for `localhost` and `127.0.0.1`, with its key.
#[allow(dead_code)]
const TEST_CERT_PEM: &[u8] = include_bytes!("fixtures/localhost.crt");
#[allow(dead_code)]
const TEST_KEY_PEM: &[u8] = include_bytes!("fixtures/localhost.key");

/// A one-shot server; `request` resolves to the bytes the client sent.
pub struct CannedServer {
    pub addr: SocketAddr,
    pub request: JoinHandle<Vec<u8>>,
}

impl CannedServer {
    /// Base URL (`http://127.0.0.1:<port>`) of this server.
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// `https://<host>:<port>` URL of this server.
    #[allow(dead_code)]
    pub fn https_url(&self, host: &str, path: &str) -> String {
        format!("https://{}:{}{}", host, self.addr.port(), path)
    }

    /// The request head the client wrote, as text.
    #[allow(dead_code)]
    pub async fn received(self) -> String {
        let bytes = self.request.await.expect("server task panicked");
        String::from_utf8(bytes).expect("request is not UTF-8")
    }
}

/// Serves `response` verbatim to the first client.
pub async fn serve_once(response: impl Into<Vec<u8>>) -> CannedServer {
    let response = response.into();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");

    let request = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept failed");
        let request = read_request_head(&mut socket).await;
        // The client may have given up already; that is what some tests check.
        let _ = socket.write_all(&response).await;
        let _ = socket.shutdown().await;
        request
    });

    CannedServer { addr, request }
}

/// Serves `response` verbatim over TLS, using the self-signed test certificate.
///
/// A client that rejects the certificate leaves the recorded request empty.
#[allow(dead_code)]
pub async fn serve_tls_once(response: impl Into<Vec<u8>>) -> CannedServer {
    let response = response.into();
    let acceptor = test_tls_acceptor();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");

    let request = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept failed");
        let Ok(mut tls) = acceptor.accept(socket).await else {
            return Vec::new();
        };
        let request = read_request_head(&mut tls).await;
        let _ = tls.write_all(&response).await;
        let _ = tls.shutdown().await;
        request
    });

    CannedServer { addr, request }
}

/// A proxy that answers one `CONNECT` with `200` and then relays bytes to
/// `upstream`, whatever host the client asked for. `request` resolves to the
/// `CONNECT` head.
#[allow(dead_code)]
pub async fn serve_connect_proxy(upstream: SocketAddr) -> CannedServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");

    let request = tokio::spawn(async move {
        let (mut client, _) = listener.accept().await.expect("accept failed");
        let connect = read_request_head(&mut client).await;
        let mut upstream = TcpStream::connect(upstream)
            .await
            .expect("proxy could not reach upstream");
        client
            .write_all(b"HTTP/1.0 200 Connection established\r\n\r\n")
            .await
            .expect("proxy reply failed");
        let _ = tokio::io::copy_bidirectional(&mut client, &mut upstream).await;
        connect
    });

    CannedServer { addr, request }
}

#[allow(dead_code)]
fn test_tls_acceptor() -> TlsAcceptor {
    rawfetch::initialization::init_crypto_provider();
    let certs = CertificateDer::pem_slice_iter(TEST_CERT_PEM)
        .collect::<Result<Vec<_>, _>>()
        .expect("test certificate is not PEM");
    let key = PrivateKeyDer::from_pem_slice(TEST_KEY_PEM).expect("test key is not PEM");
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .expect("test certificate rejected");
    TlsAcceptor::from(Arc::new(config))
}

/// Accepts one client and never answers it.
#[allow(dead_code)]
pub async fn serve_silence() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    let handle = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.expect("accept failed");
        tokio::time::sleep(Duration::from_secs(10)).await;
    });
    (addr, handle)
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    listener.local_addr().expect("listener has no address")
}

/// Test configuration: short timeouts, everything captured.
#[allow(dead_code)]
pub fn test_config() -> FetchConfig {
    let mut config = FetchConfig {
        timeout: Duration::from_secs(5),
        user_agent: "rawfetch-test/1.0".to_string(),
        ..Default::default()
    };
    config.capture.request = true;
    config.capture.response_headers = true;
    config.capture.ip_address = true;
    config
}

async fn read_request_head<S: AsyncRead + Unpin>(socket: &mut S) -> Vec<u8> {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }
    request
}
