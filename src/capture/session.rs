// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Capture session
//!
//! Owns one page for one navigation: installs interception, correlates every
//! tracked request with its eventual outcome, and returns the accumulated
//! records. Lifecycle handlers for distinct requests may overlap; the record
//! append is the only shared mutable state and is guarded by the session
//! mutex.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::classify;
use super::options::NavigationOptions;
use super::record::CapturedRequest;
use crate::driver::{NavigationOutcome, PageDriver, PageEvent, RequestSnapshot, ResponseSnapshot};
use crate::error::Result;

/// A single-use capture session over one page navigation.
pub struct CaptureSession {
    url: String,
    options: NavigationOptions,
    /// Request identity -> observation timestamp; the entry is consumed when
    /// the matching record is built.
    started_at: DashMap<String, Instant>,
    /// Accumulated records, in completion order.
    records: Mutex<Vec<CapturedRequest>>,
}

impl CaptureSession {
    /// Create a session for one target URL.
    pub fn new(url: impl Into<String>, options: NavigationOptions) -> Self {
        Self {
            url: url.into(),
            options,
            started_at: DashMap::new(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Drive the navigation to completion and return the captured requests.
    ///
    /// A navigation timeout is downgraded to a warning and yields whatever
    /// was captured up to that point; any other navigation error is fatal.
    /// The browser is closed on every terminal path.
    pub async fn run(self, driver: Arc<dyn PageDriver>) -> Result<Vec<CapturedRequest>> {
        let mut events = driver
            .take_events()
            .ok_or_else(|| crate::error::Error::other("page event stream already taken"))?;

        let session = Arc::new(self);

        // Consume lifecycle events until the driver closes the stream, then
        // wait out any handlers still extracting.
        let consumer = tokio::spawn({
            let session = Arc::clone(&session);
            let driver = Arc::clone(&driver);
            async move {
                let mut handlers = JoinSet::new();
                while let Some(event) = events.recv().await {
                    let session = Arc::clone(&session);
                    let driver = Arc::clone(&driver);
                    handlers.spawn(async move {
                        session.handle_event(event, driver).await;
                    });
                }
                while handlers.join_next().await.is_some() {}
            }
        });

        info!(url = %session.url, timeout_ms = session.options.timeout_ms, "starting capture");

        let nav_result = driver.navigate(&session.url, &session.options).await;
        let fatal = match nav_result {
            Ok(NavigationOutcome::Completed) => {
                if session.options.wait_until.is_empty() {
                    // Timeout-only mode: hold the page open for the full
                    // budget so late XHR traffic is still observed.
                    tokio::time::sleep(session.options.timeout()).await;
                }
                None
            }
            Ok(NavigationOutcome::TimedOut) => {
                warn!(
                    "timed out waiting after {}s",
                    session.options.timeout_ms / 1000
                );
                None
            }
            Err(e) if e.is_timeout() => {
                warn!(
                    "timed out waiting after {}s",
                    session.options.timeout_ms / 1000
                );
                None
            }
            Err(e) => Some(e),
        };

        if let Err(e) = driver.close().await {
            warn!(error = %e, "browser did not shut down cleanly");
        }

        // The close drops the event sender; the consumer drains and exits.
        let _ = consumer.await;

        if let Some(e) = fatal {
            return Err(e);
        }

        let records = std::mem::take(&mut *session.records.lock());
        info!(captured = records.len(), "capture finished");
        Ok(records)
    }

    async fn handle_event(&self, event: PageEvent, driver: Arc<dyn PageDriver>) {
        match event {
            PageEvent::RequestPaused(request) => {
                self.on_request_paused(request, driver).await;
            }
            PageEvent::RequestFinished { request, response } => {
                self.record_outcome(request, response, driver).await;
            }
            PageEvent::RequestFailed {
                request,
                response,
                error_text,
            } => {
                debug!(url = %request.url, error = %error_text, "request failed");
                self.record_outcome(request, response, driver).await;
            }
        }
    }

    /// Pre-send decision: stamp the observation time for every request, then
    /// abort images when the session is configured to ignore them.
    async fn on_request_paused(&self, request: RequestSnapshot, driver: Arc<dyn PageDriver>) {
        self.started_at
            .entry(request.id.clone())
            .or_insert_with(Instant::now);

        let abort = self.options.ignore_images && classify::url_is_image(&request.url);
        let decision = if abort {
            driver.abort_request(&request.id).await
        } else {
            driver.continue_request(&request.id).await
        };

        if let Err(e) = decision {
            // The request may already be gone (page teardown); not fatal.
            debug!(url = %request.url, error = %e, "interception decision not delivered");
        }
    }

    /// Build and append a record for a finished or failed tracked request.
    /// Extraction (including the body read) happens outside the lock; only
    /// the append is serialized.
    async fn record_outcome(
        &self,
        request: RequestSnapshot,
        response: Option<ResponseSnapshot>,
        driver: Arc<dyn PageDriver>,
    ) {
        if !request.resource_kind.is_tracked() {
            return;
        }

        let response_body = match response {
            Some(_) => match driver.response_body(&request.id).await {
                Ok(Some(text)) => CapturedRequest::parse_body(text),
                Ok(None) => Value::String(String::new()),
                Err(e) => {
                    debug!(url = %request.url, error = %e, "response body unreadable");
                    Value::String(String::new())
                }
            },
            None => Value::String(String::new()),
        };

        let elapsed_ms = self
            .started_at
            .remove(&request.id)
            .map(|(_, started)| CapturedRequest::round_elapsed(started.elapsed().as_secs_f64() * 1000.0))
            .unwrap_or(0.0);

        let (response_headers, response_code, is_cached) = match response {
            Some(r) => (r.headers, Some(r.status), r.from_cache),
            None => (Default::default(), None, false),
        };

        let record = CapturedRequest {
            url: request.url,
            method: request.method,
            request_headers: request.headers,
            request_body: request.post_data,
            response_headers,
            response_code,
            response_body,
            elapsed_ms,
            is_cached,
        };

        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ResourceKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tokio::sync::mpsc;

    /// Scripted driver: replays a fixed event sequence, records decisions.
    struct FakeDriver {
        events: Mutex<Option<mpsc::UnboundedReceiver<PageEvent>>>,
        sender: Mutex<Option<mpsc::UnboundedSender<PageEvent>>>,
        continued: Mutex<Vec<String>>,
        aborted: Mutex<Vec<String>>,
        bodies: BTreeMap<String, String>,
        outcome: NavigationOutcome,
    }

    impl FakeDriver {
        fn new(
            events: Vec<PageEvent>,
            bodies: BTreeMap<String, String>,
            outcome: NavigationOutcome,
        ) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            for event in events {
                tx.send(event).unwrap();
            }
            Self {
                events: Mutex::new(Some(rx)),
                sender: Mutex::new(Some(tx)),
                continued: Mutex::new(Vec::new()),
                aborted: Mutex::new(Vec::new()),
                bodies,
                outcome,
            }
        }
    }

    #[async_trait]
    impl PageDriver for FakeDriver {
        fn take_events(&self) -> Option<mpsc::UnboundedReceiver<PageEvent>> {
            self.events.lock().take()
        }

        async fn continue_request(&self, id: &str) -> Result<()> {
            self.continued.lock().push(id.to_string());
            Ok(())
        }

        async fn abort_request(&self, id: &str) -> Result<()> {
            self.aborted.lock().push(id.to_string());
            Ok(())
        }

        async fn response_body(&self, id: &str) -> Result<Option<String>> {
            Ok(self.bodies.get(id).cloned())
        }

        async fn navigate(
            &self,
            _url: &str,
            _options: &NavigationOptions,
        ) -> Result<NavigationOutcome> {
            Ok(self.outcome)
        }

        async fn close(&self) -> Result<()> {
            // Dropping the sender ends the event stream.
            self.sender.lock().take();
            Ok(())
        }
    }

    fn snapshot(id: &str, url: &str, kind: ResourceKind) -> RequestSnapshot {
        RequestSnapshot {
            id: id.to_string(),
            url: url.to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::from([("accept".to_string(), "*/*".to_string())]),
            post_data: None,
            resource_kind: kind,
        }
    }

    fn ok_response(status: u16) -> ResponseSnapshot {
        ResponseSnapshot {
            status,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            from_cache: false,
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_end_to_end_capture() {
        let xhr_ok = snapshot("r1", "https://api.example.com/data", ResourceKind::Xhr);
        let xhr_failed = snapshot("r2", "https://api.example.com/broken", ResourceKind::Fetch);
        let image = snapshot("r3", "https://cdn.example.com/logo.png", ResourceKind::Image);

        let events = vec![
            PageEvent::RequestPaused(image.clone()),
            PageEvent::RequestPaused(xhr_ok.clone()),
            PageEvent::RequestPaused(xhr_failed.clone()),
            PageEvent::RequestFinished {
                request: xhr_ok,
                response: Some(ok_response(200)),
            },
            PageEvent::RequestFailed {
                request: xhr_failed,
                response: None,
                error_text: "net::ERR_CONNECTION_RESET".to_string(),
            },
        ];
        let bodies = BTreeMap::from([("r1".to_string(), "{\"a\":1}".to_string())]);
        let driver = Arc::new(FakeDriver::new(events, bodies, NavigationOutcome::Completed));

        let options = NavigationOptions::build(None, &["load".to_string()], true);
        let session = CaptureSession::new("https://example.com", options);
        let records = session.run(driver.clone()).await.unwrap();

        // Exactly the two tracked requests, in completion order
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "https://api.example.com/data");
        assert_eq!(records[0].response_code, Some(200));
        assert_eq!(records[0].response_body, json!({"a": 1}));
        assert!(records[0].elapsed_ms >= 0.0);

        assert_eq!(records[1].url, "https://api.example.com/broken");
        assert_eq!(records[1].response_code, None);
        assert_eq!(records[1].response_body, Value::String(String::new()));
        assert!(records[1].response_headers.is_empty());
        assert!(!records[1].is_cached);

        // The image was aborted and never recorded; the XHRs continued
        assert_eq!(*driver.aborted.lock(), vec!["r3".to_string()]);
        assert_eq!(
            *driver.continued.lock(),
            vec!["r1".to_string(), "r2".to_string()]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_images_continue_when_not_ignored() {
        let image = snapshot("r1", "https://cdn.example.com/logo.png", ResourceKind::Image);
        let events = vec![PageEvent::RequestPaused(image)];
        let driver = Arc::new(FakeDriver::new(
            events,
            BTreeMap::new(),
            NavigationOutcome::Completed,
        ));

        let options = NavigationOptions::build(None, &["load".to_string()], false);
        let records = CaptureSession::new("https://example.com", options)
            .run(driver.clone())
            .await
            .unwrap();

        assert!(records.is_empty());
        assert!(driver.aborted.lock().is_empty());
        assert_eq!(*driver.continued.lock(), vec!["r1".to_string()]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_timeout_keeps_partial_results() {
        let xhr = snapshot("r1", "https://api.example.com/data", ResourceKind::Xhr);
        let events = vec![
            PageEvent::RequestPaused(xhr.clone()),
            PageEvent::RequestFinished {
                request: xhr,
                response: Some(ok_response(200)),
            },
        ];
        let driver = Arc::new(FakeDriver::new(
            events,
            BTreeMap::new(),
            NavigationOutcome::TimedOut,
        ));

        let options = NavigationOptions::build(Some(1), &["net0".to_string()], false);
        let records = CaptureSession::new("https://example.com", options)
            .run(driver)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].response_code, Some(200));
        // No readable body for r1 in this script: degrades to empty string
        assert_eq!(records[0].response_body, Value::String(String::new()));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_non_json_body_kept_as_text() {
        let xhr = snapshot("r1", "https://api.example.com/plain", ResourceKind::Xhr);
        let events = vec![
            PageEvent::RequestPaused(xhr.clone()),
            PageEvent::RequestFinished {
                request: xhr,
                response: Some(ok_response(200)),
            },
        ];
        let bodies = BTreeMap::from([("r1".to_string(), "hello world".to_string())]);
        let driver = Arc::new(FakeDriver::new(events, bodies, NavigationOutcome::Completed));

        let options = NavigationOptions::build(None, &["load".to_string()], false);
        let records = CaptureSession::new("https://example.com", options)
            .run(driver)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].response_body,
            Value::String("hello world".to_string())
        );
    }
}
