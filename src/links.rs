//! Link resolution against a shifting base URL
//!
//! Servers following the STA pattern freely mix absolute, scheme-relative
//! and path-relative URLs in `@iot.nextLink` and navigation-link fields.
//! Resolution is best effort: malformed input degrades to the original
//! string rather than failing, so a bad link can never block navigation.

use url::Url;

/// Resolve a possibly-relative URL against a base.
///
/// Empty input is returned unchanged (callers must guard). Already-absolute
/// URLs pass through; everything else is joined onto `base` per RFC 3986.
/// If neither parse succeeds the input is returned unchanged.
pub fn resolve(url: &str, base: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    if let Ok(absolute) = Url::parse(url) {
        return absolute.to_string();
    }

    match Url::parse(base).and_then(|b| b.join(url)) {
        Ok(joined) => joined.to_string(),
        Err(_) => url.to_string(),
    }
}

/// Normalize a URL to carry exactly one trailing slash.
///
/// The empty string maps to the empty string, signalling "no base yet".
pub fn ensure_trailing_slash(url: &str) -> String {
    if url.is_empty() || url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
