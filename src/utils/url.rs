//! Endpoint URL helpers.
//!
//! Base URLs come from config files and flags, so trailing slashes and
//! missing schemes are common.

/// Strips trailing slashes so endpoints can be appended safely.
///
/// ```
/// use sillage::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.siliconflow.cn/v1/"), "https://api.siliconflow.cn/v1");
/// assert_eq!(normalize_base_url("http://localhost:8080///"), "http://localhost:8080");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Joins a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use sillage::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.siliconflow.cn/v1/", "/chat/completions"),
///     "https://api.siliconflow.cn/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Checks that a configured base URL is an absolute http(s) URL with a host.
pub fn validate_base_url(base_url: &str) -> Result<String, String> {
    let normalized = normalize_base_url(base_url);
    let host = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"))
        .ok_or_else(|| format!("Base URL must start with http:// or https://, got '{base_url}'"))?;
    if host.is_empty() || host.starts_with('/') {
        return Err(format!("Base URL has no host: '{base_url}'"));
    }
    Ok(normalized)
}
