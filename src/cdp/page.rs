// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Page session over the DevTools protocol
//!
//! Translates raw protocol traffic for one target into the neutral
//! [`PageEvent`] stream the capture engine consumes, answers interception
//! pauses, tracks in-flight requests for the network-idle signals, and reads
//! response bodies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::browser::CdpBrowser;
use super::connection::{CdpEvent, Connection};
use super::types::{
    ContinueRequest, FailRequest, FetchEnable, GetResponseBody, GetResponseBodyResult,
    LoadingFailedParams, LoadingFinishedParams, Navigate, NavigateResult, RequestPattern,
    RequestPausedParams, RequestWillBeSentParams, ResponseReceivedParams,
};
use crate::capture::options::{NavigationOptions, WaitUntil};
use crate::driver::{
    NavigationOutcome, PageDriver, PageEvent, RequestSnapshot, ResourceKind, ResponseSnapshot,
};
use crate::error::{Error, Result};

/// Quiet window a network-idle signal must sustain.
const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);

/// In-flight ceiling for the relaxed network-idle signal.
const NETWORK_IDLE_RELAXED_MAX: usize = 2;

/// Lifecycle flags shared between the translator task and waiters.
struct Lifecycle {
    load_fired: AtomicBool,
    dom_fired: AtomicBool,
    notify: Notify,
}

/// Request data held between lifecycle events.
struct TrackedRequest {
    snapshot: RequestSnapshot,
    response: Option<ResponseSnapshot>,
}

/// One attached page target.
pub struct CdpPage {
    browser: Arc<CdpBrowser>,
    connection: Connection,
    session_id: String,
    events: Mutex<Option<mpsc::UnboundedReceiver<PageEvent>>>,
    /// Request identity -> pending data; doubles as the in-flight set for
    /// the network-idle signals.
    inflight: Arc<DashMap<String, TrackedRequest>>,
    /// Request identity -> Fetch-domain id of the outstanding pause.
    pause_ids: Arc<DashMap<String, String>>,
    lifecycle: Arc<Lifecycle>,
}

impl CdpPage {
    /// Wire a freshly attached target: subscribe to its events and enable
    /// the Page, Network, and Fetch domains.
    pub(crate) async fn attach(
        browser: Arc<CdpBrowser>,
        connection: Connection,
        session_id: String,
    ) -> Result<Self> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (page_tx, page_rx) = mpsc::unbounded_channel();
        connection.set_event_sender(raw_tx);

        let inflight: Arc<DashMap<String, TrackedRequest>> = Arc::new(DashMap::new());
        let pause_ids: Arc<DashMap<String, String>> = Arc::new(DashMap::new());
        let lifecycle = Arc::new(Lifecycle {
            load_fired: AtomicBool::new(false),
            dom_fired: AtomicBool::new(false),
            notify: Notify::new(),
        });

        tokio::spawn(translate_events(
            raw_rx,
            page_tx,
            session_id.clone(),
            Arc::clone(&inflight),
            Arc::clone(&pause_ids),
            Arc::clone(&lifecycle),
        ));

        let page = Self {
            browser,
            connection,
            session_id,
            events: Mutex::new(Some(page_rx)),
            inflight,
            pause_ids,
            lifecycle,
        };

        page.send("Page.enable", json!({})).await?;
        page.send("Network.enable", json!({})).await?;
        page.send(
            "Fetch.enable",
            serde_json::to_value(FetchEnable {
                patterns: vec![RequestPattern {
                    url_pattern: "*".to_string(),
                }],
            })?,
        )
        .await?;

        Ok(page)
    }

    async fn send(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        self.connection
            .send(method, Some(&self.session_id), params)
            .await
    }

    /// Wait until a single readiness signal is satisfied.
    async fn wait_for(&self, signal: WaitUntil) {
        match signal {
            WaitUntil::Load => self.wait_for_flag(&self.lifecycle.load_fired).await,
            WaitUntil::DomContentLoaded => self.wait_for_flag(&self.lifecycle.dom_fired).await,
            WaitUntil::NetworkIdleStrict => self.wait_for_idle(0).await,
            WaitUntil::NetworkIdleRelaxed => {
                self.wait_for_idle(NETWORK_IDLE_RELAXED_MAX).await
            }
        }
    }

    async fn wait_for_flag(&self, flag: &AtomicBool) {
        loop {
            // Register interest before checking, or a notify_waiters call
            // landing between the check and the await is lost.
            let notified = self.lifecycle.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if flag.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    /// Wait until the in-flight count stays at or below `max` for the quiet
    /// window.
    async fn wait_for_idle(&self, max: usize) {
        loop {
            let notified = self.lifecycle.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inflight.len() <= max {
                match timeout(NETWORK_IDLE_QUIET, notified).await {
                    // Quiet window elapsed without network activity
                    Err(_) if self.inflight.len() <= max => return,
                    _ => continue,
                }
            } else {
                notified.await;
            }
        }
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<PageEvent>> {
        self.events.lock().take()
    }

    async fn continue_request(&self, id: &str) -> Result<()> {
        let Some((_, pause_id)) = self.pause_ids.remove(id) else {
            trace!(id, "no outstanding pause to continue");
            return Ok(());
        };
        self.send(
            "Fetch.continueRequest",
            serde_json::to_value(ContinueRequest {
                request_id: &pause_id,
            })?,
        )
        .await?;
        Ok(())
    }

    async fn abort_request(&self, id: &str) -> Result<()> {
        let Some((_, pause_id)) = self.pause_ids.remove(id) else {
            trace!(id, "no outstanding pause to abort");
            return Ok(());
        };
        self.send(
            "Fetch.failRequest",
            serde_json::to_value(FailRequest {
                request_id: &pause_id,
                error_reason: "Aborted",
            })?,
        )
        .await?;
        Ok(())
    }

    async fn response_body(&self, id: &str) -> Result<Option<String>> {
        let value = self
            .send(
                "Network.getResponseBody",
                serde_json::to_value(GetResponseBody { request_id: id })?,
            )
            .await?;
        let result: GetResponseBodyResult = serde_json::from_value(value)
            .map_err(|e| Error::protocol("Network.getResponseBody", e.to_string()))?;

        if result.base64_encoded {
            let bytes = BASE64
                .decode(result.body.as_bytes())
                .map_err(|e| Error::protocol("Network.getResponseBody", e.to_string()))?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        } else {
            Ok(Some(result.body))
        }
    }

    async fn navigate(
        &self,
        url: &str,
        options: &NavigationOptions,
    ) -> Result<NavigationOutcome> {
        let value = self
            .send("Page.navigate", serde_json::to_value(Navigate { url })?)
            .await?;
        let result: NavigateResult = serde_json::from_value(value)
            .map_err(|e| Error::protocol("Page.navigate", e.to_string()))?;
        if let Some(error_text) = result.error_text {
            return Err(Error::navigation(url, error_text));
        }

        // With no readiness signal configured the navigation-level default
        // applies: the load event.
        let signals = if options.wait_until.is_empty() {
            vec![WaitUntil::Load]
        } else {
            options.wait_until.clone()
        };

        let waited = timeout(options.timeout(), async {
            for signal in signals {
                self.wait_for(signal).await;
            }
        })
        .await;

        match waited {
            Ok(()) => Ok(NavigationOutcome::Completed),
            Err(_) => Ok(NavigationOutcome::TimedOut),
        }
    }

    async fn close(&self) -> Result<()> {
        self.browser.close().await
    }
}

/// Translate raw protocol events for one session into [`PageEvent`]s.
async fn translate_events(
    mut raw_rx: mpsc::UnboundedReceiver<CdpEvent>,
    page_tx: mpsc::UnboundedSender<PageEvent>,
    session_id: String,
    inflight: Arc<DashMap<String, TrackedRequest>>,
    pause_ids: Arc<DashMap<String, String>>,
    lifecycle: Arc<Lifecycle>,
) {
    while let Some(event) = raw_rx.recv().await {
        if event.session_id.as_deref() != Some(session_id.as_str()) {
            continue;
        }

        match event.method.as_str() {
            "Fetch.requestPaused" => {
                let params: RequestPausedParams = match serde_json::from_value(event.params) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(error = %e, "bad Fetch.requestPaused payload");
                        continue;
                    }
                };
                // The Network-domain id links the pause to loading events;
                // fall back to the Fetch id when the browser omits it.
                let identity = params
                    .network_id
                    .clone()
                    .unwrap_or_else(|| params.request_id.clone());
                pause_ids.insert(identity.clone(), params.request_id);

                let snapshot = RequestSnapshot {
                    id: identity.clone(),
                    url: params.request.url,
                    method: params.request.method,
                    headers: params.request.headers,
                    post_data: params.request.post_data,
                    resource_kind: ResourceKind::from_protocol(&params.resource_type),
                };
                // Only requests with a Network-domain id ever see loading
                // events, so only those belong in the in-flight set.
                if params.network_id.is_some() {
                    inflight.insert(
                        identity,
                        TrackedRequest {
                            snapshot: snapshot.clone(),
                            response: None,
                        },
                    );
                    lifecycle.notify.notify_waiters();
                }
                let _ = page_tx.send(PageEvent::RequestPaused(snapshot));
            }

            "Network.requestWillBeSent" => {
                let params: RequestWillBeSentParams = match serde_json::from_value(event.params) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(error = %e, "bad Network.requestWillBeSent payload");
                        continue;
                    }
                };
                let kind = params
                    .resource_type
                    .as_deref()
                    .map(ResourceKind::from_protocol)
                    .unwrap_or(ResourceKind::Other);
                // Redirect hops reuse the id; keep the latest request data.
                let snapshot = RequestSnapshot {
                    id: params.request_id.clone(),
                    url: params.request.url,
                    method: params.request.method,
                    headers: params.request.headers,
                    post_data: params.request.post_data,
                    resource_kind: kind,
                };
                inflight.insert(
                    params.request_id,
                    TrackedRequest {
                        snapshot,
                        response: None,
                    },
                );
                lifecycle.notify.notify_waiters();
            }

            "Network.responseReceived" => {
                let params: ResponseReceivedParams = match serde_json::from_value(event.params) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(error = %e, "bad Network.responseReceived payload");
                        continue;
                    }
                };
                if let Some(mut entry) = inflight.get_mut(&params.request_id) {
                    entry.response = Some(ResponseSnapshot {
                        status: params.response.status,
                        headers: params.response.headers,
                        from_cache: params.response.from_disk_cache
                            || params.response.from_prefetch_cache,
                    });
                }
            }

            "Network.loadingFinished" => {
                let params: LoadingFinishedParams = match serde_json::from_value(event.params) {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                if let Some((_, tracked)) = inflight.remove(&params.request_id) {
                    let _ = page_tx.send(PageEvent::RequestFinished {
                        request: tracked.snapshot,
                        response: tracked.response,
                    });
                }
                lifecycle.notify.notify_waiters();
            }

            "Network.loadingFailed" => {
                let params: LoadingFailedParams = match serde_json::from_value(event.params) {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                if let Some((_, tracked)) = inflight.remove(&params.request_id) {
                    debug!(
                        url = %tracked.snapshot.url,
                        error = %params.error_text,
                        canceled = params.canceled,
                        "loading failed"
                    );
                    let _ = page_tx.send(PageEvent::RequestFailed {
                        request: tracked.snapshot,
                        response: tracked.response,
                        error_text: params.error_text,
                    });
                }
                lifecycle.notify.notify_waiters();
            }

            "Page.loadEventFired" => {
                lifecycle.load_fired.store(true, Ordering::Release);
                lifecycle.notify.notify_waiters();
            }

            "Page.domContentEventFired" => {
                lifecycle.dom_fired.store(true, Ordering::Release);
                lifecycle.notify.notify_waiters();
            }

            _ => {}
        }
    }

    // Raw stream ended (browser closed); page_tx drops here, ending the
    // capture engine's event stream in turn.
}
