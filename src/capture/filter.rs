// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request filter pipeline
//!
//! A chain of optional, independently-toggleable predicates over the captured
//! set. Criteria are ANDed: a record survives only if it passes every
//! supplied check. With no criteria supplied the input is returned untouched.

use super::classify;
use super::record::CapturedRequest;

/// Filter criteria for captured requests.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Keep only requests to this domain
    pub include_domain: Option<String>,
    /// Drop requests to this domain
    pub exclude_domain: Option<String>,
    /// Keep only URLs containing this text
    pub url_contains: Option<String>,
    /// Drop URLs containing this text
    pub url_not_contains: Option<String>,
    /// Keep only URLs whose path ends with this text
    pub url_ends_with: Option<String>,
    /// Drop URLs whose path ends with this text
    pub url_not_ends_with: Option<String>,
    /// Drop redirect responses (status in [300, 400))
    pub ignore_redirects: bool,
}

impl FilterCriteria {
    /// Create empty criteria (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only requests to this domain.
    pub fn include_domain(mut self, domain: impl Into<String>) -> Self {
        self.include_domain = Some(domain.into());
        self
    }

    /// Drop requests to this domain.
    pub fn exclude_domain(mut self, domain: impl Into<String>) -> Self {
        self.exclude_domain = Some(domain.into());
        self
    }

    /// Keep only URLs containing this text.
    pub fn url_contains(mut self, text: impl Into<String>) -> Self {
        self.url_contains = Some(text.into());
        self
    }

    /// Drop URLs containing this text.
    pub fn url_not_contains(mut self, text: impl Into<String>) -> Self {
        self.url_not_contains = Some(text.into());
        self
    }

    /// Keep only URLs whose path ends with this text.
    pub fn url_ends_with(mut self, text: impl Into<String>) -> Self {
        self.url_ends_with = Some(text.into());
        self
    }

    /// Drop URLs whose path ends with this text.
    pub fn url_not_ends_with(mut self, text: impl Into<String>) -> Self {
        self.url_not_ends_with = Some(text.into());
        self
    }

    /// Drop redirect responses.
    pub fn ignore_redirects(mut self, ignore: bool) -> Self {
        self.ignore_redirects = ignore;
        self
    }

    /// Whether no criterion is supplied.
    pub fn is_empty(&self) -> bool {
        self.include_domain.is_none()
            && self.exclude_domain.is_none()
            && self.url_contains.is_none()
            && self.url_not_contains.is_none()
            && self.url_ends_with.is_none()
            && self.url_not_ends_with.is_none()
            && !self.ignore_redirects
    }

    /// Apply the criteria, preserving the input order of survivors.
    ///
    /// Identity short-circuit: with no criteria supplied the input sequence
    /// is returned unchanged.
    pub fn apply(&self, records: Vec<CapturedRequest>) -> Vec<CapturedRequest> {
        if self.is_empty() {
            return records;
        }

        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    fn matches(&self, record: &CapturedRequest) -> bool {
        if let Some(ref domain) = self.include_domain {
            if !classify::url_is_domain(&record.url, domain) {
                return false;
            }
        }
        if let Some(ref domain) = self.exclude_domain {
            if classify::url_is_domain(&record.url, domain) {
                return false;
            }
        }
        if let Some(ref text) = self.url_contains {
            if !classify::url_contains(&record.url, text) {
                return false;
            }
        }
        if let Some(ref text) = self.url_not_contains {
            if classify::url_contains(&record.url, text) {
                return false;
            }
        }
        if let Some(ref text) = self.url_ends_with {
            if !classify::url_ends_with(&record.url, text) {
                return false;
            }
        }
        if let Some(ref text) = self.url_not_ends_with {
            if classify::url_ends_with(&record.url, text) {
                return false;
            }
        }
        if self.ignore_redirects && is_redirect(record) {
            return false;
        }

        true
    }
}

fn is_redirect(record: &CapturedRequest) -> bool {
    record
        .response_code
        .map(|status| (300..400).contains(&status))
        .unwrap_or(false)
}
