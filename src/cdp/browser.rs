// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser process management
//!
//! Launches a headless Chromium with a throwaway profile, or attaches to an
//! already-running one via its DevTools HTTP endpoint. Closing tears down the
//! connection, the child process, and the profile directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::page::CdpPage;
use super::types::{
    AttachToTarget, AttachToTargetResult, CreateBrowserContext, CreateBrowserContextResult,
    CreateTarget, CreateTargetResult, VersionInfo,
};
use crate::error::{Error, Result};

/// How long to wait for the spawned browser to announce its endpoint.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

lazy_static! {
    /// Chromium prints "DevTools listening on ws://..." to stderr on startup.
    static ref WS_ENDPOINT_RE: Regex =
        Regex::new(r"DevTools listening on (ws://\S+)").expect("valid endpoint regex");
}

/// Candidate binary locations, checked in order when no explicit path or
/// `CHROME` env var is given.
const CHROME_CANDIDATES: [&str; 6] = [
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

/// Launch configuration for a browser process.
#[derive(Debug, Clone)]
pub struct BrowserLaunchConfig {
    /// Explicit browser binary; falls back to `$CHROME`, then common paths
    pub binary: Option<PathBuf>,
    /// Run without a visible window
    pub headless: bool,
    /// Extra command-line arguments appended verbatim
    pub extra_args: Vec<String>,
}

impl Default for BrowserLaunchConfig {
    fn default() -> Self {
        Self {
            binary: None,
            headless: true,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserLaunchConfig {
    /// Create a default launch config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the browser binary path.
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Toggle headless mode.
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Append an extra browser argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

/// A connected browser, either spawned by us or attached to.
pub struct CdpBrowser {
    connection: Connection,
    child: Mutex<Option<Child>>,
    /// Kept for its Drop: the profile directory is removed with the browser.
    _profile_dir: Option<TempDir>,
    closed: AtomicBool,
}

impl CdpBrowser {
    /// Spawn a fresh browser process and connect to it.
    pub async fn launch(config: BrowserLaunchConfig) -> Result<Arc<Self>> {
        let binary = resolve_binary(config.binary.as_deref())?;
        let profile_dir = TempDir::new()?;

        let mut command = Command::new(&binary);
        command
            .arg("--remote-debugging-port=0")
            .arg(format!("--user-data-dir={}", profile_dir.path().display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-extensions")
            .arg("--disable-gpu")
            .arg("--mute-audio");
        if config.headless {
            command.arg("--headless=new");
        }
        for arg in &config.extra_args {
            command.arg(arg);
        }
        command
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(binary = %binary.display(), "launching browser");
        let mut child = command
            .spawn()
            .map_err(|e| Error::launch(format!("failed to spawn {}: {}", binary.display(), e)))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::launch("browser stderr not captured"))?;

        let ws_url = timeout(LAUNCH_TIMEOUT, scrape_ws_endpoint(stderr))
            .await
            .map_err(|_| Error::launch("browser did not announce its DevTools endpoint"))??;

        let connection = Connection::connect(&ws_url).await?;

        Ok(Arc::new(Self {
            connection,
            child: Mutex::new(Some(child)),
            _profile_dir: Some(profile_dir),
            closed: AtomicBool::new(false),
        }))
    }

    /// Attach to an already-running browser.
    ///
    /// Accepts a `ws://` DevTools URL directly, or an `http(s)://host:port`
    /// endpoint resolved through `GET /json/version`.
    pub async fn connect(endpoint: &str) -> Result<Arc<Self>> {
        let ws_url = if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            endpoint.to_string()
        } else {
            discover_ws_url(endpoint).await?
        };

        let connection = Connection::connect(&ws_url).await?;

        Ok(Arc::new(Self {
            connection,
            child: Mutex::new(None),
            _profile_dir: None,
            closed: AtomicBool::new(false),
        }))
    }

    /// Open one page in a fresh, isolated browser context.
    pub async fn new_page(self: Arc<Self>) -> Result<CdpPage> {
        let context: CreateBrowserContextResult = self
            .send("Target.createBrowserContext", None, CreateBrowserContext {
                dispose_on_detach: true,
            })
            .await?;

        let target: CreateTargetResult = self
            .send("Target.createTarget", None, CreateTarget {
                url: "about:blank",
                browser_context_id: Some(&context.browser_context_id),
            })
            .await?;

        let attached: AttachToTargetResult = self
            .send("Target.attachToTarget", None, AttachToTarget {
                target_id: &target.target_id,
                flatten: true,
            })
            .await?;

        debug!(
            target_id = %target.target_id,
            session_id = %attached.session_id,
            "page attached"
        );

        let connection = self.connection.clone();
        CdpPage::attach(self, connection, attached.session_id).await
    }

    /// Whether `close` has completed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the browser: best-effort `Browser.close`, then reap the child.
    /// Idempotent.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let graceful = timeout(
            Duration::from_secs(5),
            self.connection.send("Browser.close", None, json!({})),
        )
        .await;
        if !matches!(graceful, Ok(Ok(_))) {
            debug!("browser did not close gracefully");
        }
        self.connection.shutdown();

        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                // Already exited via Browser.close
                debug!(error = %e, "browser process already gone");
            }
            let _ = child.wait().await;
        }

        info!("browser closed");
        Ok(())
    }

    async fn send<P: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        session_id: Option<&str>,
        params: P,
    ) -> Result<R> {
        let value = self
            .connection
            .send(method, session_id, serde_json::to_value(params)?)
            .await?;
        serde_json::from_value(value)
            .map_err(|e| Error::protocol(method, format!("unexpected result shape: {}", e)))
    }
}

/// Read stderr lines until the DevTools endpoint announcement appears.
async fn scrape_ws_endpoint(stderr: tokio::process::ChildStderr) -> Result<String> {
    let mut lines = BufReader::new(stderr).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(captures) = WS_ENDPOINT_RE.captures(&line) {
            let url = captures[1].to_string();
            // Keep draining stderr so the browser never blocks on the pipe.
            tokio::spawn(async move {
                let mut lines = lines;
                while let Ok(Some(_)) = lines.next_line().await {}
            });
            return Ok(url);
        }
    }
    Err(Error::launch(
        "browser exited before announcing its DevTools endpoint",
    ))
}

/// Resolve the DevTools WebSocket URL of a running browser over HTTP.
pub async fn discover_ws_url(endpoint: &str) -> Result<String> {
    let url = format!("{}/json/version", endpoint.trim_end_matches('/'));
    let info: VersionInfo = reqwest::get(&url).await?.error_for_status()?.json().await?;
    if let Some(browser) = &info.browser {
        debug!(browser = %browser, "discovered running browser");
    }
    Ok(info.web_socket_debugger_url)
}

fn resolve_binary(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::launch(format!(
            "browser binary not found at {}",
            path.display()
        )));
    }

    if let Ok(env_path) = std::env::var("CHROME") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
    }

    for candidate in CHROME_CANDIDATES {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }

    Err(Error::launch(
        "no Chromium binary found; pass --chrome or set $CHROME",
    ))
}

impl Drop for CdpBrowser {
    fn drop(&mut self) {
        if !self.is_closed() {
            // kill_on_drop reaps the child; the connection task exits when
            // the socket drops with the process.
            self.connection.shutdown();
            warn!("browser dropped without close(); killing process");
        }
    }
}
