// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! pagetap CLI
//!
//! Capture the XHR/fetch requests of one page load, filter them, print a
//! summary, and optionally export as CSV or JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use pagetap::capture::classify;
use pagetap::{
    console, export, BrowserLaunchConfig, CaptureSession, CapturedRequest, CdpBrowser,
    FilterCriteria, NavigationOptions, PageDriver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Capture XHR/fetch requests issued during a page load.
#[derive(Debug, Parser)]
#[command(name = "pagetap", version, about)]
struct Cli {
    /// URL to open in the browser
    #[arg(short, long)]
    url: String,

    /// Timeout in seconds (default 1 minute)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Readiness signal to wait for; partial text allowed
    /// (load, dom, net0, net2). Repeatable.
    #[arg(short, long = "wait-for")]
    wait_for: Vec<String>,

    /// Include only this domain
    #[arg(long = "include-domain")]
    include_domain: Option<String>,

    /// Everything except this domain
    #[arg(long = "exclude-domain")]
    exclude_domain: Option<String>,

    /// Include URLs containing this text (case insensitive)
    #[arg(long = "url-contains")]
    url_contains: Option<String>,

    /// Exclude URLs containing this text (case insensitive)
    #[arg(long = "url-not-contains")]
    url_not_contains: Option<String>,

    /// Include URLs whose path ends with this text (case insensitive)
    #[arg(long = "url-endswith")]
    url_endswith: Option<String>,

    /// Exclude URLs whose path ends with this text (case insensitive)
    #[arg(long = "url-not-endswith")]
    url_not_endswith: Option<String>,

    /// Exclude redirected requests
    #[arg(long = "ignore-redirect")]
    ignore_redirect: bool,

    /// Abort image requests before they are sent (best guess by extension)
    #[arg(long = "ignore-images")]
    ignore_images: bool,

    /// Directory to place the result file in
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format of the result file
    #[arg(short, long, value_enum, default_value = "csv")]
    fmt: OutputFormat,

    /// Path to the Chromium binary (falls back to $CHROME, then common paths)
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Attach to a running browser instead of launching one
    /// (ws:// DevTools URL or http://host:port)
    #[arg(long = "ws-endpoint")]
    ws_endpoint: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "pagetap=debug"
    } else {
        "pagetap=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            console::error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let url = classify::normalize_target_url(&cli.url)?;
    let options = NavigationOptions::build(cli.timeout, &cli.wait_for, cli.ignore_images);

    let browser = match &cli.ws_endpoint {
        Some(endpoint) => CdpBrowser::connect(endpoint).await?,
        None => {
            let mut config = BrowserLaunchConfig::new();
            if let Some(chrome) = &cli.chrome {
                config = config.binary(chrome);
            }
            CdpBrowser::launch(config).await?
        }
    };
    let page: Arc<dyn PageDriver> = Arc::new(browser.new_page().await?);

    let records = CaptureSession::new(&url, options).run(page).await?;
    let records = criteria_from(&cli).apply(records);

    if records.is_empty() {
        console::warning("No XHR requests found for the given criteria");
        return Ok(());
    }

    for record in &records {
        println!();
        println!("{}", record);
    }

    if let Some(dir) = &cli.output {
        anyhow::ensure!(dir.is_dir(), "output directory {} does not exist", dir.display());
        let path = dir.join(export::filename_for_url(&url, cli.fmt.extension()));
        write_results(&path, cli.fmt, &records)?;
        console::success(&format!("File {} created with results", path.display()));
    }

    Ok(())
}

fn write_results(
    path: &std::path::Path,
    fmt: OutputFormat,
    records: &[CapturedRequest],
) -> pagetap::Result<()> {
    match fmt {
        OutputFormat::Csv => export::write_csv(path, records),
        OutputFormat::Json => export::write_json(path, records),
    }
}

fn criteria_from(cli: &Cli) -> FilterCriteria {
    FilterCriteria {
        include_domain: cli.include_domain.clone(),
        exclude_domain: cli.exclude_domain.clone(),
        url_contains: cli.url_contains.clone(),
        url_not_contains: cli.url_not_contains.clone(),
        url_ends_with: cli.url_endswith.clone(),
        url_not_ends_with: cli.url_not_endswith.clone(),
        ignore_redirects: cli.ignore_redirect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_capture_flags() {
        let cli = Cli::parse_from([
            "pagetap",
            "-u",
            "https://example.com",
            "-t",
            "30",
            "-w",
            "dom",
            "-w",
            "net2",
            "--ignore-images",
            "--ignore-redirect",
            "--include-domain",
            "example.com",
            "-f",
            "json",
        ]);

        assert_eq!(cli.url, "https://example.com");
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.wait_for, vec!["dom", "net2"]);
        assert!(cli.ignore_images);
        assert!(cli.ignore_redirect);
        assert_eq!(cli.fmt, OutputFormat::Json);
        assert_eq!(cli.include_domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_criteria_mapping() {
        let cli = Cli::parse_from([
            "pagetap",
            "-u",
            "example.com",
            "--url-endswith",
            ".json",
            "--exclude-domain",
            "ads.net",
        ]);
        let criteria = criteria_from(&cli);
        assert_eq!(criteria.url_ends_with.as_deref(), Some(".json"));
        assert_eq!(criteria.exclude_domain.as_deref(), Some("ads.net"));
        assert!(!criteria.ignore_redirects);
        assert!(!criteria.is_empty());
    }

    #[test]
    fn test_format_default_is_csv() {
        let cli = Cli::parse_from(["pagetap", "-u", "example.com"]);
        assert_eq!(cli.fmt, OutputFormat::Csv);
        assert_eq!(cli.fmt.extension(), "csv");
    }
}
