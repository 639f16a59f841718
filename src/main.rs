//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `rawfetch` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing the response (head to stderr, body to stdout or a file)
//!
//! All fetching is implemented in the library crate.

use std::io::Write;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use rawfetch::config::cli::{Opt, StrategyChoice};
use rawfetch::initialization::{init_crypto_provider, init_logger_with};
use rawfetch::{
    CommandRenderer, FetchError, FetchRequest, FetchStrategy, Fetcher, Renderer, Response,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A .env next to the working directory may carry RUST_LOG
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;
    init_crypto_provider();

    let config = opt.to_fetch_config()?;
    let mut request = FetchRequest::parse(&opt.url)?;
    if let Some(cookie) = &opt.cookie {
        request = request.with_cookie(cookie.clone());
    }
    if let Some(modified) = opt.if_modified_since {
        request = request.with_modified_time(modified);
    }

    let result = match &opt.render_command {
        Some(program) => {
            let renderer = CommandRenderer::new(program.clone(), opt.render_args.clone());
            fetch(Fetcher::with_renderer(config, renderer)?, &request, &opt.strategy).await
        }
        None => fetch(Fetcher::new(config)?, &request, &opt.strategy).await,
    };

    match result {
        Ok(response) => {
            print_head(&response);
            write_body(&response, &opt).await
        }
        Err(e) => {
            eprintln!("rawfetch error [{}]: {}", e.category(), e);
            process::exit(1);
        }
    }
}

async fn fetch<R: Renderer>(
    fetcher: Fetcher<R>,
    request: &FetchRequest,
    choice: &StrategyChoice,
) -> Result<Response, FetchError> {
    match choice {
        StrategyChoice::Auto => fetcher.fetch(request).await,
        StrategyChoice::Direct => {
            fetcher
                .fetch_with_strategy(request, FetchStrategy::Direct)
                .await
        }
        StrategyChoice::Render => {
            fetcher
                .fetch_with_strategy(request, FetchStrategy::Render)
                .await
        }
    }
}

fn print_head(response: &Response) {
    let status = response.status().to_string();
    let status = if response.status() == 200 {
        status.green()
    } else {
        status.yellow()
    };
    eprintln!("{} {} ({})", status, response.url(), response.strategy());

    if let Some(raw_request) = response.raw_request() {
        eprintln!("{}", "> request".dimmed());
        for line in raw_request.lines() {
            eprintln!("> {line}");
        }
    }
    match response.raw_headers() {
        Some(raw) => eprint!("{raw}"),
        None => eprint!("{}", response.headers()),
    }
    if let Some(ip) = response.peer_ip() {
        eprintln!("{} {ip}", "peer:".dimmed());
    }
    if let Some(tls) = response.tls() {
        eprintln!("{} {} {}", "tls:".dimmed(), tls.protocol, tls.cipher_suite);
        if let Some(cert) = &tls.peer_certificate {
            eprintln!("{} {} (issuer {})", "cert:".dimmed(), cert.subject, cert.issuer);
        }
    }
}

async fn write_body(response: &Response, opt: &Opt) -> Result<()> {
    match &opt.output {
        Some(path) => {
            tokio::fs::write(path, response.body())
                .await
                .with_context(|| format!("Failed to write body to {}", path.display()))?;
            eprintln!("{} bytes written to {}", response.body().len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(response.body())
                .context("Failed to write body to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}
