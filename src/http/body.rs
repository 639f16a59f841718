//! Response body reading and content decoding.

use std::io::{self, Read};

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use log::{debug, trace, warn};
use tokio::io::AsyncRead;

use crate::config::{BUFFER_SIZE, HEADER_CONTENT_ENCODING, HEADER_CONTENT_LENGTH, HEADER_CONTENT_TYPE};
use crate::error_handling::FetchError;
use crate::http::headers::Headers;
use crate::http::reader::WireReader;

const STATUS_OK: u16 = 200;

/// Content codings understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// `gzip` or `x-gzip`
    Gzip,
    /// `deflate`
    Deflate,
    /// Anything else, passed through untouched
    Identity,
}

impl ContentEncoding {
    /// Interprets a `Content-Encoding` header value.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("gzip") || v.eq_ignore_ascii_case("x-gzip") => {
                ContentEncoding::Gzip
            }
            Some(v) if v.eq_ignore_ascii_case("deflate") => ContentEncoding::Deflate,
            _ => ContentEncoding::Identity,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Deflate => "deflate",
            ContentEncoding::Identity => "identity",
        }
    }
}

/// Returns `true` if a content type names an HTML or XHTML document.
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}

/// The declared `Content-Length`, if any. A negative value declares an empty
/// body.
///
/// # Errors
///
/// `FetchError::BadContentLength` if the header is present but not an integer.
fn declared_length(headers: &Headers) -> Result<Option<usize>, FetchError> {
    headers
        .get(HEADER_CONTENT_LENGTH)
        .map(|value| match value.trim().parse::<i64>() {
            Ok(n) if n < 0 => Ok(0),
            Ok(n) => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
            Err(_) => Err(FetchError::BadContentLength(value.to_string())),
        })
        .transpose()
}

/// The body size limit: the smaller of the declared length and the
/// configured maximum, `None` when neither applies.
fn effective_cap(declared: Option<usize>, max_content_length: Option<usize>) -> Option<usize> {
    match (declared, max_content_length) {
        (Some(declared), Some(max)) => Some(declared.min(max)),
        (declared, max) => declared.or(max),
    }
}

/// Reads and decodes the body that follows a parsed head.
///
/// HTML documents are refused: they belong on the rendering path. For status
/// 200 every read or decode failure is returned; for any other status the
/// failure is logged and whatever was read so far (after decoding, or nothing
/// if decoding failed) becomes the body. An encoded body cut short by
/// `max_content_length` is decoded as far as its bytes allow.
pub(crate) async fn read_body<R>(
    reader: &mut WireReader<R>,
    status: u16,
    headers: &Headers,
    max_content_length: Option<usize>,
) -> Result<Vec<u8>, FetchError>
where
    R: AsyncRead + Unpin,
{
    if let Some(content_type) = headers.get(HEADER_CONTENT_TYPE) {
        if is_html_content_type(content_type) {
            return Err(FetchError::HtmlContent(content_type.to_string()));
        }
    }

    let mut body = Vec::new();
    let mut truncated = false;
    let read = match declared_length(headers) {
        Ok(declared) => {
            let cap = effective_cap(declared, max_content_length);
            let read = read_capped(reader, cap, &mut body).await;
            truncated = max_content_length
                .is_some_and(|max| body.len() >= max && declared.map_or(true, |d| d > max));
            read
        }
        Err(e) => Err(e),
    };
    if let Err(e) = read {
        if status == STATUS_OK {
            return Err(e);
        }
        debug!("Keeping {} body bytes of status {status} response after error: {e}", body.len());
    }
    trace!("Read {} raw body bytes", body.len());

    let encoding = ContentEncoding::from_header(headers.get(HEADER_CONTENT_ENCODING));
    match decode(body, encoding, max_content_length, truncated) {
        Ok(decoded) => Ok(decoded),
        Err(e) if status != STATUS_OK => {
            warn!("Discarding undecodable body of status {status} response: {e}");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Appends to `body` until end of stream or until `cap` bytes are held.
async fn read_capped<R>(
    reader: &mut WireReader<R>,
    cap: Option<usize>,
    body: &mut Vec<u8>,
) -> Result<(), FetchError>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; BUFFER_SIZE];
    loop {
        let want = match cap {
            Some(cap) if body.len() >= cap => return Ok(()),
            Some(cap) => (cap - body.len()).min(BUFFER_SIZE),
            None => BUFFER_SIZE,
        };
        let n = reader.read(&mut chunk[..want]).await?;
        if n == 0 {
            return Ok(());
        }
        body.extend_from_slice(&chunk[..n]);
    }
}

/// Decodes `body` according to `encoding`.
///
/// Decoded output is cut at `max_content_length`. Deflate bodies are tried
/// with zlib framing first and raw deflate framing second, since servers send
/// both under the same name.
///
/// # Errors
///
/// `FetchError::Decompression` if the encoded data is corrupt or incomplete.
pub fn decode_body(
    body: Vec<u8>,
    encoding: ContentEncoding,
    max_content_length: Option<usize>,
) -> Result<Vec<u8>, FetchError> {
    decode(body, encoding, max_content_length, false)
}

/// Like [`decode_body`], but a `truncated` body keeps whatever decoded before
/// the stream ran out instead of failing.
fn decode(
    body: Vec<u8>,
    encoding: ContentEncoding,
    max_content_length: Option<usize>,
    truncated: bool,
) -> Result<Vec<u8>, FetchError> {
    let limit = max_content_length.map_or(u64::MAX, |max| max as u64);
    let inflated = match encoding {
        ContentEncoding::Identity => return Ok(body),
        ContentEncoding::Gzip => inflate(GzDecoder::new(&body[..]), limit),
        ContentEncoding::Deflate => {
            let zlib = inflate(ZlibDecoder::new(&body[..]), limit);
            if zlib.error.is_none() || (truncated && !zlib.output.is_empty()) {
                zlib
            } else {
                inflate(DeflateDecoder::new(&body[..]), limit)
            }
        }
    };

    let decoded = match inflated.error {
        None => inflated.output,
        Some(e) if truncated => {
            debug!(
                "Kept {} bytes decoded from {} body cut at {} bytes: {e}",
                inflated.output.len(),
                encoding.name(),
                body.len()
            );
            inflated.output
        }
        Some(source) => {
            return Err(FetchError::Decompression {
                encoding: encoding.name(),
                source,
            })
        }
    };
    debug!(
        "Decoded {} {} bytes into {} bytes",
        body.len(),
        encoding.name(),
        decoded.len()
    );
    Ok(decoded)
}

/// Decoder output, plus the error that stopped it early.
struct Inflated {
    output: Vec<u8>,
    error: Option<io::Error>,
}

fn inflate<D: Read>(decoder: D, limit: u64) -> Inflated {
    let mut output = Vec::new();
    // read_to_end keeps everything decoded before an error in `output`.
    let error = decoder.take(limit).read_to_end(&mut output).err();
    Inflated { output, error }
}
