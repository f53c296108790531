// src/utils/domain.rs

//! Registrable-domain keys for website URLs.

use url::Url;

/// Schemes that never point at a crawlable website.
const NON_WEB_SCHEMES: [&str; 4] = ["mailto:", "tel:", "javascript:", "data:"];

/// Canonicalize a website URI to its registrable domain (effective TLD + 1).
///
/// Accepts bare hostnames and protocol-relative URLs. Returns `None` for
/// empty input, non-web schemes, or strings that do not parse as a URL.
///
/// # Examples
/// ```
/// use silverfish::utils::domain::normalize_domain;
///
/// assert_eq!(
///     normalize_domain("https://WWW2.Example.co.uk/path?x=1"),
///     Some("example.co.uk".to_string())
/// );
/// ```
pub fn normalize_domain(website: &str) -> Option<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if NON_WEB_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    let candidate = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else if !trimmed.contains("://") {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    };

    let parsed = Url::parse(&candidate).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.trim_end_matches('.');
    if host.is_empty() {
        return None;
    }

    let host = strip_www(host);
    match psl::domain_str(host) {
        Some(domain) => Some(domain.to_string()),
        None => Some(host.to_string()),
    }
}

/// Strip a leading `www.`, `www2.`, `www10.` ... label.
fn strip_www(host: &str) -> &str {
    let Some(rest) = host.strip_prefix("www") else {
        return host;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    match rest.strip_prefix('.') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => host,
    }
}
