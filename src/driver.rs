// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser-automation driver boundary
//!
//! The capture engine consumes a browser through this trait: a stream of
//! request-lifecycle events plus per-request interception decisions and body
//! reads. The concrete implementation lives in [`crate::cdp`]; tests drive
//! the engine with scripted fakes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::capture::options::NavigationOptions;
use crate::error::Result;

/// Resource type of an observed request, as reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Top-level or iframe document
    Document,
    /// Stylesheet
    Stylesheet,
    /// Image
    Image,
    /// Audio/video
    Media,
    /// Font
    Font,
    /// Script
    Script,
    /// XMLHttpRequest
    Xhr,
    /// Fetch API
    Fetch,
    /// WebSocket handshake
    WebSocket,
    /// Anything else
    Other,
}

impl ResourceKind {
    /// Whether this resource type is captured into records. Only asynchronous
    /// data requests (XHR/fetch) are; everything else is observed solely for
    /// the interception decision.
    pub fn is_tracked(self) -> bool {
        matches!(self, ResourceKind::Xhr | ResourceKind::Fetch)
    }

    /// Map a DevTools `Network.ResourceType` string.
    pub fn from_protocol(value: &str) -> Self {
        match value {
            "Document" => ResourceKind::Document,
            "Stylesheet" => ResourceKind::Stylesheet,
            "Image" => ResourceKind::Image,
            "Media" => ResourceKind::Media,
            "Font" => ResourceKind::Font,
            "Script" => ResourceKind::Script,
            "XHR" => ResourceKind::Xhr,
            "Fetch" => ResourceKind::Fetch,
            "WebSocket" => ResourceKind::WebSocket,
            _ => ResourceKind::Other,
        }
    }
}

/// Request-side snapshot delivered with every lifecycle event.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// Stable request identity within the session
    pub id: String,
    /// Request URL
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Request body, if any
    pub post_data: Option<String>,
    /// Resource type
    pub resource_kind: ResourceKind,
}

/// Response-side snapshot, attached once the browser has received headers.
#[derive(Debug, Clone, Default)]
pub struct ResponseSnapshot {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Whether the response was served from cache
    pub from_cache: bool,
}

/// Request-lifecycle events emitted by the page driver.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// A request is paused pre-send and awaits a continue/abort decision
    RequestPaused(RequestSnapshot),
    /// A request finished loading
    RequestFinished {
        request: RequestSnapshot,
        response: Option<ResponseSnapshot>,
    },
    /// A request failed or was aborted
    RequestFailed {
        request: RequestSnapshot,
        response: Option<ResponseSnapshot>,
        error_text: String,
    },
}

/// How a navigation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// All requested readiness signals were reached in time
    Completed,
    /// The time budget elapsed first; captured requests are kept
    TimedOut,
}

/// A single browser page the capture engine can drive.
///
/// Implementations must keep emitting lifecycle events until [`close`] drops
/// the event sender, which is how the engine learns the stream has ended.
///
/// [`close`]: PageDriver::close
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Take the page-event receiver. Yields `None` on the second call.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<PageEvent>>;

    /// Let a paused request proceed unmodified.
    async fn continue_request(&self, id: &str) -> Result<()>;

    /// Abort a paused request; it is never sent.
    async fn abort_request(&self, id: &str) -> Result<()>;

    /// Read a finished request's response body as text.
    ///
    /// `Ok(None)` and `Err` both mean "no readable body"; callers degrade to
    /// an empty string.
    async fn response_body(&self, id: &str) -> Result<Option<String>>;

    /// Navigate and wait for the configured readiness signals within the
    /// timeout budget. With no signals configured, the navigation-level
    /// default (the load event) applies.
    async fn navigate(
        &self,
        url: &str,
        options: &NavigationOptions,
    ) -> Result<NavigationOutcome>;

    /// Release the underlying browser. Idempotent; always called on every
    /// terminal path of a capture session.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_kinds() {
        assert!(ResourceKind::Xhr.is_tracked());
        assert!(ResourceKind::Fetch.is_tracked());
        assert!(!ResourceKind::Document.is_tracked());
        assert!(!ResourceKind::Image.is_tracked());
        assert!(!ResourceKind::Script.is_tracked());
    }

    #[test]
    fn test_from_protocol() {
        assert_eq!(ResourceKind::from_protocol("XHR"), ResourceKind::Xhr);
        assert_eq!(ResourceKind::from_protocol("Fetch"), ResourceKind::Fetch);
        assert_eq!(ResourceKind::from_protocol("Image"), ResourceKind::Image);
        assert_eq!(ResourceKind::from_protocol("Ping"), ResourceKind::Other);
    }
}
