//! The rendering collaborator.
//!
//! Pages that need script execution are handed to an external browser engine
//! instead of the raw socket. The engine is abstracted behind [`Renderer`] so
//! callers can plug in whatever automation they run; [`CommandRenderer`]
//! drives one through a command line.

use std::future::Future;
use std::process::Stdio;

use log::debug;
use tokio::process::Command;
use url::Url;

use crate::config::RenderOptions;
use crate::error_handling::RenderError;
use crate::utils::sanitize::file_stem_for_url;

/// A browser engine that loads a page and returns the resulting markup.
pub trait Renderer: Send + Sync {
    /// Loads `url` presenting `user_agent` and returns the page source after
    /// scripts have run.
    fn render(
        &self,
        url: &Url,
        user_agent: &str,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<String, RenderError>> + Send;
}

/// Refuses every render. Useful when only raw documents are fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRenderer;

impl Renderer for NoRenderer {
    async fn render(
        &self,
        url: &Url,
        _user_agent: &str,
        _options: &RenderOptions,
    ) -> Result<String, RenderError> {
        Err(RenderError::Unavailable(url.to_string()))
    }
}

/// Runs a headless-browser command and takes its standard output as the
/// rendered markup.
///
/// These placeholders are substituted in every argument:
///
/// | placeholder    | value                                              |
/// |----------------|----------------------------------------------------|
/// | `{url}`        | the URL to render                                  |
/// | `{user_agent}` | the configured User-Agent                          |
/// | `{settle_ms}`  | settle delay in milliseconds (`0` when unset)      |
/// | `{screenshot}` | screenshot path, empty when screenshots are off    |
///
/// The process is killed once the page-load timeout plus the settle delay has
/// passed.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Creates a renderer running `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, url: &Url, user_agent: &str, options: &RenderOptions) -> Vec<String> {
        let settle_ms = options
            .settle_delay
            .map_or(0, |delay| delay.as_millis())
            .to_string();
        let screenshot = options
            .screenshot_dir
            .as_ref()
            .map(|dir| {
                dir.join(format!("{}.png", file_stem_for_url(url.as_str())))
                    .display()
                    .to_string()
            })
            .unwrap_or_default();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{url}", url.as_str())
                    .replace("{user_agent}", user_agent)
                    .replace("{settle_ms}", &settle_ms)
                    .replace("{screenshot}", &screenshot)
            })
            .collect()
    }
}

impl Renderer for CommandRenderer {
    async fn render(
        &self,
        url: &Url,
        user_agent: &str,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        let args = self.expand_args(url, user_agent, options);
        debug!("Rendering {url} with {} {:?}", self.program, args);

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let limit = options.page_load_timeout + options.settle_delay.unwrap_or_default();
        let output = tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| RenderError::Timeout(limit))?
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("Rendered {url}: {} bytes of markup", output.stdout.len());
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
