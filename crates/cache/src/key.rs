//! Resource-identity normalization for cache keys.
//!
//! Cosmetic URL variations of the same logical page must share one cache
//! slot, so the key strips the transient parts of the address: query string
//! and fragment. Host casing is handled by the URL parser.

/// Normalize a resource identifier into a cache key.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Strip query string and fragment
///
/// Input that does not parse as a URL is used verbatim (trimmed); key
/// normalization never fails.
pub fn normalize_key(resource: &str) -> String {
    let trimmed = resource.trim();

    if trimmed.is_empty() {
        return String::new();
    }

    let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    match url::Url::parse(&with_scheme) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}
