// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! URL classification predicates
//!
//! Pure, stateless helpers used by the interception policy (image blocking)
//! and the filter pipeline. All comparisons are case-insensitive and
//! whitespace-trimmed; empty inputs always classify as false.

use url::Url;

use crate::error::{Error, Result};

/// Extensions treated as images by `url_is_image`. Covers only common types.
const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".tiff", ".gif", ".bmp"];

/// Check whether a URL's path ends with the given suffix.
///
/// Parsing first means query strings are ignored when possible
/// (`example.com/image.png?q=small` still ends with `.png`). When the URL
/// cannot be parsed, or the path check does not match, the raw string is
/// compared as a fallback.
pub fn url_ends_with(url: &str, suffix: &str) -> bool {
    let url = url.trim().to_lowercase();
    let suffix = suffix.trim().to_lowercase();
    if url.is_empty() || suffix.is_empty() {
        return false;
    }

    if let Ok(parsed) = Url::parse(&url) {
        let path = parsed.path();
        if !path.is_empty() && path.ends_with(&suffix) {
            return true;
        }
    }

    url.ends_with(&suffix)
}

/// Check whether a URL contains the given text anywhere.
///
/// Intentionally broader than `url_ends_with`: the whole URL is searched,
/// query string included.
pub fn url_contains(url: &str, needle: &str) -> bool {
    let url = url.trim().to_lowercase();
    let needle = needle.trim().to_lowercase();
    if url.is_empty() || needle.is_empty() {
        return false;
    }

    url.contains(&needle)
}

/// Check whether a URL belongs to the given domain.
///
/// The URL's host must end with the candidate domain's host, so a subdomain
/// matches its parent domain but not vice versa.
pub fn url_is_domain(url: &str, domain: &str) -> bool {
    match (host_of(url), host_of(domain)) {
        (Some(actual), Some(expected)) => actual.ends_with(&expected),
        _ => false,
    }
}

/// Best-guess check for image URLs, by path extension.
pub fn url_is_image(url: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| url_ends_with(url, ext))
}

/// Extract the lowercased host from a URL or bare domain string.
fn host_of(input: &str) -> Option<String> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = Url::parse(&input) {
        if let Some(host) = parsed.host_str() {
            return Some(host.to_string());
        }
    }

    // Bare domains ("example.com") carry no scheme; retry with one so the
    // host parses instead of landing in the path component.
    Url::parse(&format!("http://{}", input.trim_start_matches('/')))
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Validate and normalize a user-supplied target URL.
///
/// Accepts scheme-less input (`example.com/page`) and defaults the scheme to
/// `http`, since the browser does not prefix one itself. Fails with
/// [`Error::InvalidUrl`] when no host can be determined.
pub fn normalize_target_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_url(raw, "URL is empty"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed.trim_start_matches('/'))
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| Error::invalid_url(trimmed, e.to_string()))?;

    if parsed.host_str().is_none() {
        return Err(Error::invalid_url(
            trimmed,
            "host (domain) could not be determined",
        ));
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ends_with_ignores_query_string() {
        assert!(url_ends_with("https://example.com/image.png?q=small", ".png"));
        assert!(url_ends_with("https://example.com/api/data.json?v=2&t=1", ".json"));
        assert!(!url_ends_with("https://example.com/image.png?q=small", ".jpg"));
    }

    #[test]
    fn test_ends_with_raw_fallback() {
        // Not parseable as an absolute URL, falls back to raw comparison
        assert!(url_ends_with("example.com/image.png", ".png"));
        assert!(url_ends_with("  HTTPS://EXAMPLE.COM/A.PNG  ", ".png"));
    }

    #[test]
    fn test_ends_with_empty_inputs() {
        assert!(!url_ends_with("", ".png"));
        assert!(!url_ends_with("https://example.com/a.png", ""));
    }

    #[test]
    fn test_contains_searches_whole_url() {
        assert!(url_contains("https://example.com/a?token=abc", "token"));
        assert!(url_contains("https://EXAMPLE.com/API/users", "api"));
        assert!(!url_contains("https://example.com", "missing"));
        assert!(!url_contains("", "x"));
    }

    #[test]
    fn test_domain_subdomain_matches_parent() {
        assert!(url_is_domain("https://api.sub.example.com/x", "example.com"));
        assert!(url_is_domain("https://example.com/x", "https://example.com"));
        assert!(!url_is_domain("https://example.com", "sub.example.com"));
        assert!(!url_is_domain("", "example.com"));
        assert!(!url_is_domain("https://example.com", ""));
    }

    #[test]
    fn test_is_image_all_extensions() {
        for ext in ["png", "jpg", "jpeg", "tiff", "gif", "bmp"] {
            let url = format!("https://cdn.example.com/pic.{}", ext);
            assert!(url_is_image(&url), "{} should classify as image", url);
            let upper = format!("https://cdn.example.com/PIC.{}", ext.to_uppercase());
            assert!(url_is_image(&upper), "{} should classify as image", upper);
        }
        assert!(url_is_image("https://cdn.example.com/pic.png?size=large"));
        assert!(!url_is_image("https://cdn.example.com/pic.svg"));
        assert!(!url_is_image("https://example.com/api/images"));
    }

    #[test]
    fn test_normalize_adds_default_scheme() {
        assert_eq!(
            normalize_target_url("example.com/page").unwrap(),
            "http://example.com/page"
        );
        assert_eq!(
            normalize_target_url("//example.com").unwrap(),
            "http://example.com/"
        );
    }

    #[test]
    fn test_normalize_keeps_explicit_scheme() {
        assert_eq!(
            normalize_target_url("https://example.com/a?b=1").unwrap(),
            "https://example.com/a?b=1"
        );
    }

    #[test]
    fn test_normalize_rejects_hostless_input() {
        assert!(normalize_target_url("").is_err());
        assert!(normalize_target_url("   ").is_err());
    }
}
