// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # pagetap - XHR/fetch capture for page loads
//!
//! Drives a headless Chromium over the DevTools protocol, intercepts every
//! request issued during one page navigation, and captures the XHR/fetch
//! traffic with timing, headers, and bodies. Captured records run through a
//! composable filter pipeline and export as CSV or JSON.
//!
//! ## Features
//!
//! - Request interception: every outbound request gets a continue/abort
//!   decision (optional image blocking)
//! - Response correlation: status, headers, body (JSON parsed when
//!   decodable), cache flag, elapsed time per request
//! - Fuzzy readiness hints: "load", "dom", "net0", "net2"
//! - Domain/substring/suffix filters, redirect exclusion
//! - Launches its own browser with a throwaway profile, or attaches to a
//!   running one
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pagetap::{BrowserLaunchConfig, CaptureSession, CdpBrowser, NavigationOptions};
//!
//! #[tokio::main]
//! async fn main() -> pagetap::Result<()> {
//!     let browser = CdpBrowser::launch(BrowserLaunchConfig::default()).await?;
//!     let page = browser.new_page().await?;
//!
//!     let options = NavigationOptions::build(None, &["net0".to_string()], false);
//!     let session = CaptureSession::new("https://example.com", options);
//!     let records = session.run(Arc::new(page)).await?;
//!
//!     for record in &records {
//!         println!("{}", record);
//!     }
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod cdp;
pub mod console;
pub mod driver;
pub mod error;
pub mod export;

// Re-exports for convenience

// Capture engine
pub use capture::{
    CaptureSession, CapturedRequest, FilterCriteria, NavigationOptions, WaitUntil,
    DEFAULT_TIMEOUT_MS, FIELD_NAMES,
};

// Driver boundary
pub use driver::{
    NavigationOutcome, PageDriver, PageEvent, RequestSnapshot, ResourceKind, ResponseSnapshot,
};

// DevTools driver
pub use cdp::{BrowserLaunchConfig, CdpBrowser, CdpPage};

// Errors
pub use error::{Error, Result};

// Export
pub use export::{filename_for_url, write_csv, write_json};

/// pagetap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
