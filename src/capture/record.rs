// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Captured request records
//!
//! One record per finished-or-failed XHR/fetch request. Records are built by
//! the capture session and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names in flattened export order. The CSV header is taken from here
/// via the first record.
pub const FIELD_NAMES: [&str; 9] = [
    "url",
    "method",
    "request_headers",
    "request_body",
    "response_headers",
    "response_code",
    "response_body",
    "elapsed_ms",
    "is_cached",
];

/// Full snapshot of one tracked request and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedRequest {
    /// Request URL
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Request headers
    pub request_headers: BTreeMap<String, String>,
    /// Request body, if the request carried one
    pub request_body: Option<String>,
    /// Response headers (empty when no response arrived)
    pub response_headers: BTreeMap<String, String>,
    /// Response status code (absent when the request aborted/failed)
    pub response_code: Option<u16>,
    /// Response body: parsed JSON when decodable, raw text otherwise,
    /// empty string when unreadable
    pub response_body: Value,
    /// Elapsed time in milliseconds, rounded to 2 decimal places
    /// (0 when no start time was recorded)
    pub elapsed_ms: f64,
    /// Whether the response was served from cache
    pub is_cached: bool,
}

impl CapturedRequest {
    /// Parse a response body: JSON when it decodes, raw text otherwise.
    pub fn parse_body(text: String) -> Value {
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => Value::String(text),
        }
    }

    /// Round an elapsed-time measurement to 2 decimal places.
    pub fn round_elapsed(ms: f64) -> f64 {
        (ms * 100.0).round() / 100.0
    }

    /// Flatten the record into `(field, value)` pairs for tabular export,
    /// in [`FIELD_NAMES`] order.
    pub fn flatten(&self) -> Vec<(&'static str, String)> {
        vec![
            ("url", self.url.clone()),
            ("method", self.method.clone()),
            ("request_headers", map_to_json(&self.request_headers)),
            ("request_body", self.request_body.clone().unwrap_or_default()),
            ("response_headers", map_to_json(&self.response_headers)),
            (
                "response_code",
                self.response_code.map(|c| c.to_string()).unwrap_or_default(),
            ),
            ("response_body", body_to_string(&self.response_body)),
            ("elapsed_ms", format!("{}", self.elapsed_ms)),
            ("is_cached", self.is_cached.to_string()),
        ]
    }
}

impl fmt::Display for CapturedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.response_code {
            Some(code) => write!(
                f,
                "{} - {} - <response code {} returned in {} ms>",
                self.method, self.url, code, self.elapsed_ms
            ),
            None => write!(
                f,
                "{} - {} - <no response after {} ms>",
                self.method, self.url, self.elapsed_ms
            ),
        }
    }
}

fn map_to_json(map: &BTreeMap<String, String>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

fn body_to_string(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
