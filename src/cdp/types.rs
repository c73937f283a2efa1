// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Hand-written DevTools protocol types
//!
//! Only the dozen commands and events the capture engine actually uses, as a
//! minimal replacement for generated full-protocol bindings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Message envelope
// ============================================================================

/// Incoming frame: either a command response (`id` set) or an event
/// (`method` set). Session-scoped traffic carries a `sessionId`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ProtocolError>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Error payload on a rejected command.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Outgoing command frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingCommand<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    pub params: Value,
}

// ============================================================================
// Target domain
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContext {
    pub dispose_on_detach: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContextResult {
    pub browser_context_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTarget<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTarget<'a> {
    pub target_id: &'a str,
    pub flatten: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
    pub session_id: String,
}

// ============================================================================
// Page domain
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigate<'a> {
    pub url: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
    #[serde(default)]
    pub frame_id: String,
    /// Set when the navigation could not start (e.g. name resolution failed)
    #[serde(default)]
    pub error_text: Option<String>,
}

// ============================================================================
// Network domain
// ============================================================================

/// Request payload shared by `requestWillBeSent` and `requestPaused`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub post_data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSentParams {
    pub request_id: String,
    pub request: NetworkRequest,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub from_disk_cache: bool,
    #[serde(default)]
    pub from_prefetch_cache: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedParams {
    pub request_id: String,
    pub response: NetworkResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinishedParams {
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailedParams {
    pub request_id: String,
    #[serde(default)]
    pub error_text: String,
    #[serde(default)]
    pub canceled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponseBody<'a> {
    pub request_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponseBodyResult {
    pub body: String,
    #[serde(default)]
    pub base64_encoded: bool,
}

// ============================================================================
// Fetch domain (interception)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchEnable {
    pub patterns: Vec<RequestPattern>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPattern {
    pub url_pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPausedParams {
    /// Fetch-domain id, used to answer the pause
    pub request_id: String,
    pub request: NetworkRequest,
    #[serde(default)]
    pub resource_type: String,
    /// Network-domain id linking the pause to loading events
    #[serde(default)]
    pub network_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueRequest<'a> {
    pub request_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailRequest<'a> {
    pub request_id: &'a str,
    pub error_reason: &'a str,
}

// ============================================================================
// DevTools HTTP discovery
// ============================================================================

/// Response of `GET /json/version` on a running browser.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser", default)]
    pub browser: Option<String>,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_event_frame() {
        let raw = r#"{
            "method": "Network.loadingFinished",
            "params": {"requestId": "1000.2", "timestamp": 1.0, "encodedDataLength": 42},
            "sessionId": "SESSION1"
        }"#;
        let message: IncomingMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(message.method.as_deref(), Some("Network.loadingFinished"));
        assert_eq!(message.session_id.as_deref(), Some("SESSION1"));

        let params: LoadingFinishedParams =
            serde_json::from_value(message.params.unwrap()).unwrap();
        assert_eq!(params.request_id, "1000.2");
    }

    #[test]
    fn test_deserialize_response_frame() {
        let raw = r#"{"id": 7, "result": {"targetId": "T1"}}"#;
        let message: IncomingMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(message.id, Some(7));

        let result: CreateTargetResult =
            serde_json::from_value(message.result.unwrap()).unwrap();
        assert_eq!(result.target_id, "T1");
    }

    #[test]
    fn test_deserialize_error_frame() {
        let raw = r#"{"id": 3, "error": {"code": -32000, "message": "No data found"}}"#;
        let message: IncomingMessage = serde_json::from_str(raw).unwrap();
        let error = message.error.unwrap();
        assert_eq!(error.code, -32000);
        assert_eq!(error.message, "No data found");
    }

    #[test]
    fn test_deserialize_request_paused() {
        let raw = r#"{
            "requestId": "interception-job-1.0",
            "request": {
                "url": "https://api.example.com/data",
                "method": "POST",
                "headers": {"Content-Type": "application/json"},
                "postData": "{\"q\":1}",
                "initialPriority": "High",
                "referrerPolicy": "origin"
            },
            "frameId": "F1",
            "resourceType": "XHR",
            "networkId": "1000.4"
        }"#;
        let params: RequestPausedParams = serde_json::from_str(raw).unwrap();
        assert_eq!(params.resource_type, "XHR");
        assert_eq!(params.network_id.as_deref(), Some("1000.4"));
        assert_eq!(params.request.method, "POST");
        assert_eq!(params.request.post_data.as_deref(), Some("{\"q\":1}"));
    }

    #[test]
    fn test_deserialize_response_received() {
        let raw = r#"{
            "requestId": "1000.4",
            "loaderId": "L1",
            "timestamp": 2.5,
            "type": "XHR",
            "response": {
                "url": "https://api.example.com/data",
                "status": 200,
                "statusText": "OK",
                "headers": {"content-type": "application/json"},
                "mimeType": "application/json",
                "fromDiskCache": true
            }
        }"#;
        let params: ResponseReceivedParams = serde_json::from_str(raw).unwrap();
        assert_eq!(params.response.status, 200);
        assert!(params.response.from_disk_cache);
        assert!(!params.response.from_prefetch_cache);
    }

    #[test]
    fn test_serialize_outgoing_command() {
        let command = OutgoingCommand {
            id: 1,
            method: "Fetch.continueRequest",
            session_id: Some("S1"),
            params: serde_json::to_value(ContinueRequest { request_id: "R1" }).unwrap(),
        };
        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains("\"sessionId\":\"S1\""));
        assert!(json.contains("\"requestId\":\"R1\""));
    }

    #[test]
    fn test_deserialize_version_info() {
        let raw = r#"{
            "Browser": "Chrome/120.0.6099.109",
            "Protocol-Version": "1.3",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        }"#;
        let info: VersionInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(
            info.web_socket_debugger_url,
            "ws://127.0.0.1:9222/devtools/browser/abc"
        );
        assert!(info.browser.unwrap().starts_with("Chrome"));
    }
}
