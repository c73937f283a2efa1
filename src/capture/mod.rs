// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request-capture engine: classification, navigation options, the capture
//! session itself, and the post-capture filter pipeline.

pub mod classify;
pub mod filter;
pub mod options;
pub mod record;
pub mod session;

pub use filter::FilterCriteria;
pub use options::{NavigationOptions, WaitUntil, DEFAULT_TIMEOUT_MS};
pub use record::{CapturedRequest, FIELD_NAMES};
pub use session::CaptureSession;
