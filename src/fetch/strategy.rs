//! Routing between the raw socket and the rendering engine.

use std::fmt;

use url::Url;

/// How a URL is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Raw HTTP/1.0 over a socket; for documents that need no script execution
    Direct,
    /// Through the rendering collaborator
    Render,
}

impl FetchStrategy {
    /// Picks the strategy for `url`.
    ///
    /// URLs whose last path segment ends in one of `raw_file_extensions`
    /// (compared without regard to ASCII case) go direct, everything else is
    /// rendered.
    pub fn select(url: &Url, raw_file_extensions: &[String]) -> Self {
        match file_extension(url) {
            Some(ext)
                if raw_file_extensions
                    .iter()
                    .any(|raw| raw.trim_start_matches('.').eq_ignore_ascii_case(ext)) =>
            {
                FetchStrategy::Direct
            }
            _ => FetchStrategy::Render,
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchStrategy::Direct => "direct",
            FetchStrategy::Render => "render",
        })
    }
}

fn file_extension(url: &Url) -> Option<&str> {
    let segment = url.path().rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(url: &str) -> FetchStrategy {
        let raw = vec!["pdf".to_string(), ".zip".to_string()];
        FetchStrategy::select(&Url::parse(url).unwrap(), &raw)
    }

    #[test]
    fn test_raw_extensions_go_direct() {
        assert_eq!(select("http://example.test/report.pdf"), FetchStrategy::Direct);
        assert_eq!(select("http://example.test/REPORT.PDF"), FetchStrategy::Direct);
        assert_eq!(select("http://example.test/a/b/archive.zip"), FetchStrategy::Direct);
        assert_eq!(select("http://example.test/report.pdf?dl=1"), FetchStrategy::Direct);
    }

    #[test]
    fn test_everything_else_is_rendered() {
        assert_eq!(select("http://example.test/"), FetchStrategy::Render);
        assert_eq!(select("http://example.test/index.html"), FetchStrategy::Render);
        assert_eq!(select("http://example.test/pdf"), FetchStrategy::Render);
        assert_eq!(select("http://example.test/docs.pdf/view"), FetchStrategy::Render);
        assert_eq!(select("http://example.test/trailing."), FetchStrategy::Render);
    }
}
