//! Utility functions and helpers.

pub mod domain;
pub mod http;
pub mod phone;

use url::Url;

/// Resolve an anchor `href` against the page URL.
///
/// Fragment-only links resolve to nothing and fragments are dropped from
/// the result, so `page#a` and `page#b` are the same link.
pub fn absolute_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with('#') {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// Canonical form of a link used to decide whether it was already queued:
/// one trailing slash removed, query string dropped.
pub fn link_key(link: &str) -> String {
    let trimmed = link.strip_suffix('/').unwrap_or(link);
    match Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            absolute_url(&base, "page.html").unwrap().as_str(),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            absolute_url(&base, "/contact#map").unwrap().as_str(),
            "https://example.com/contact"
        );
        assert_eq!(
            absolute_url(&base, "https://other.com/x").unwrap().as_str(),
            "https://other.com/x"
        );
        assert!(absolute_url(&base, "#top").is_none());
    }

    #[test]
    fn test_link_key_strips_slash_and_query() {
        assert_eq!(
            link_key("https://example.com/contact/"),
            "https://example.com/contact"
        );
        assert_eq!(
            link_key("https://example.com/order?utm_source=x&id=2"),
            "https://example.com/order"
        );
        assert_eq!(
            link_key("https://example.com/menu/?a=1"),
            "https://example.com/menu/"
        );
    }
}
