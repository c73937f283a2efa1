// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Result serialization
//!
//! CSV and JSON writers over the flattened record shape, plus filename
//! derivation from the target URL. The CSV header is taken from the first
//! record's field names; cell newlines are replaced so one record stays one
//! row.

use std::fs::File;
use std::path::Path;

use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::capture::record::CapturedRequest;
use crate::error::Result;

lazy_static! {
    static ref NON_FILENAME_CHARS: Regex =
        Regex::new(r"[^0-9a-zA-Z\-_]+").expect("valid filename regex");
}

/// Fallback base name when the URL yields neither host nor path.
const DEFAULT_BASENAME: &str = "xhr_requests";

/// Write records as CSV. The header row comes from the first record's
/// flattened field names; an empty record set produces an empty file.
pub fn write_csv(path: &Path, records: &[CapturedRequest]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let Some(first) = records.first() else {
        writer.flush()?;
        return Ok(());
    };

    let header: Vec<&str> = first.flatten().iter().map(|(name, _)| *name).collect();
    writer.write_record(&header)?;

    for record in records {
        let row: Vec<String> = record
            .flatten()
            .into_iter()
            .map(|(_, value)| sanitize_cell(&value))
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write records as an indented JSON array.
pub fn write_json(path: &Path, records: &[CapturedRequest]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, records)?;
    Ok(())
}

/// Derive a timestamped filename from a URL.
///
/// Uses the host with dots replaced by underscores (path as fallback),
/// strips anything that is not filename-safe, and appends a
/// `_YYYYmmddHHMMSS` suffix plus the extension.
pub fn filename_for_url(url: &str, ext: &str) -> String {
    let base = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            if let Some(host) = parsed.host_str() {
                Some(host.replace('.', "_"))
            } else {
                let path = parsed.path().replace(['.', '/'], "_");
                (!path.is_empty()).then_some(path)
            }
        })
        .unwrap_or_else(|| DEFAULT_BASENAME.to_string());

    let base = NON_FILENAME_CHARS.replace_all(&base, "");
    let base = if base.is_empty() {
        DEFAULT_BASENAME
    } else {
        base.as_ref()
    };

    let stamp = Local::now().format("%Y%m%d%H%M%S");
    let ext = ext.trim_start_matches('.');
    format!("{}_{}.{}", base, stamp, ext)
}

/// Replace line separators so a multi-line value stays a single CSV row.
fn sanitize_cell(value: &str) -> String {
    value.replace("\r\n", "\t").replace(['\r', '\n'], "\t")
}
