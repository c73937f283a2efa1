// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Navigation options and wait-condition resolution
//!
//! User-supplied wait hints are loose text ("dom", "net2", "networkidle0");
//! the resolver maps them onto the fixed set of page-readiness signals. The
//! matching order and fallback behavior are user-visible defaults and must
//! not change.

use std::time::Duration;

/// Default navigation timeout (1 min).
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Page-readiness signals a navigation can wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// The load event fired
    Load,
    /// The DOM has been parsed
    DomContentLoaded,
    /// No in-flight network connections for 500ms
    NetworkIdleStrict,
    /// At most 2 in-flight network connections for 500ms
    NetworkIdleRelaxed,
}

impl WaitUntil {
    /// Resolve a loose textual hint to a readiness signal.
    ///
    /// First match wins: "load", then "dom", then "net"+"2", then "net".
    /// Partial input is accepted ("net0" relaxed, "net2" strict). Empty or
    /// unrecognized hints resolve to `None`.
    pub fn guess(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_lowercase();
        if hint.is_empty() {
            return None;
        }

        if hint.contains("load") {
            Some(WaitUntil::Load)
        } else if hint.contains("dom") {
            Some(WaitUntil::DomContentLoaded)
        } else if hint.contains("net") && hint.contains('2') {
            Some(WaitUntil::NetworkIdleStrict)
        } else if hint.contains("net") {
            Some(WaitUntil::NetworkIdleRelaxed)
        } else {
            None
        }
    }
}

/// Options for a single navigation, built once per session.
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Navigation time budget in milliseconds
    pub timeout_ms: u64,
    /// Readiness signals to wait for, in the order given (duplicates kept).
    /// Empty means timeout-only: the session holds the page open for the
    /// full budget after the navigation-level default wait resolves.
    pub wait_until: Vec<WaitUntil>,
    /// Abort image requests before they are sent
    pub ignore_images: bool,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self::build(None, &[], false)
    }
}

impl NavigationOptions {
    /// Assemble navigation options from user input.
    ///
    /// An explicit timeout with no wait hints yields timeout-only options.
    /// Otherwise missing hints default to load + relaxed network idle, and
    /// each hint is resolved fuzzily; unresolvable hints are skipped.
    pub fn build(timeout_secs: Option<u64>, wait_hints: &[String], ignore_images: bool) -> Self {
        let timeout_ms = timeout_secs
            .map(|secs| secs * 1000)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        if timeout_secs.is_some() && wait_hints.is_empty() {
            return Self {
                timeout_ms,
                wait_until: Vec::new(),
                ignore_images,
            };
        }

        let wait_until = if wait_hints.is_empty() {
            vec![WaitUntil::Load, WaitUntil::NetworkIdleRelaxed]
        } else {
            wait_hints
                .iter()
                .filter_map(|hint| WaitUntil::guess(hint))
                .collect()
        };

        Self {
            timeout_ms,
            wait_until,
            ignore_images,
        }
    }

    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
