// src/services/extractor.rs

//! Page extractor.
//!
//! Turns one fetched HTML page into phone, email and ordering-link
//! findings plus the list of links worth following.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Node, Selector};
use url::Url;

use crate::models::{ExtractionConfig, SiteRecord};
use crate::utils::phone::{find_phone_candidates, normalize_phone};
use crate::utils::{absolute_url, link_key};

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Everything one page contributes to its site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFindings {
    /// Normalized phone numbers, first-seen order, `tel:` links first
    pub phones: Vec<String>,

    /// Address of the first `mailto:` link
    pub email: Option<String>,

    /// Absolute links containing "order", deduplicated within the page
    pub ordering_links: Vec<String>,

    /// Normalized keyword links to hand to the fetcher
    pub follow: Vec<String>,

    /// A keyword link pointed at a delivery platform
    pub blocked_link_seen: bool,
}

impl PageFindings {
    /// Merge into the site record.
    pub fn apply_to(&self, record: &mut SiteRecord, max_ordering_links: usize) {
        for phone in &self.phones {
            record.add_phone(phone.clone());
        }
        if let Some(email) = &self.email {
            record.add_email(email.clone());
        }
        for link in &self.ordering_links {
            record.add_ordering_link(link.clone(), max_ordering_links);
        }
        if self.blocked_link_seen {
            record.has_online_ordering = true;
        }
    }
}

/// Extracts contact findings from pages using fixed keyword tables.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    follow_keywords: Vec<String>,
    blocked_keywords: Vec<String>,
    max_ordering_links: usize,
}

impl PageExtractor {
    /// Create an extractor. Keywords are matched case-insensitively.
    pub fn new(
        follow_keywords: Vec<String>,
        blocked_keywords: Vec<String>,
        max_ordering_links: usize,
    ) -> Self {
        let lower = |words: Vec<String>| -> Vec<String> {
            words.into_iter().map(|w| w.to_lowercase()).collect()
        };
        Self {
            follow_keywords: lower(follow_keywords),
            blocked_keywords: lower(blocked_keywords),
            max_ordering_links,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.follow_keywords.clone(),
            config.blocked_keywords.clone(),
            config.max_ordering_links,
        )
    }

    pub fn max_ordering_links(&self) -> usize {
        self.max_ordering_links
    }

    /// Extract findings from an HTML page fetched from `base`.
    pub fn extract(&self, html: &str, base: &Url) -> PageFindings {
        let document = Html::parse_document(html);
        let anchors: Vec<&str> = document
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .collect();

        let mut findings = PageFindings::default();

        // tel: links are the most reliable source, scan them first
        for href in &anchors {
            if let Some(raw) = strip_scheme(href, "tel:") {
                if let Some(phone) = normalize_phone(raw) {
                    push_unique(&mut findings.phones, phone);
                }
            }
        }
        for candidate in find_phone_candidates(&visible_text(&document)) {
            if let Some(phone) = normalize_phone(candidate) {
                push_unique(&mut findings.phones, phone);
            }
        }

        findings.email = anchors
            .iter()
            .find_map(|href| strip_scheme(href, "mailto:"))
            .map(|addr| addr.split('?').next().unwrap_or(addr).trim().to_string())
            .filter(|addr| !addr.is_empty());

        let mut seen_ordering = HashSet::new();
        let mut seen_follow = HashSet::new();
        for href in &anchors {
            let Some(link) = absolute_url(base, href) else {
                continue;
            };
            let web = matches!(link.scheme(), "http" | "https");

            let link = link.to_string();
            if link.contains("order") && seen_ordering.insert(link.clone()) {
                findings.ordering_links.push(link.clone());
            }
            if !web {
                continue;
            }

            let key = link_key(&link);
            let lower = key.to_lowercase();
            if !self.is_follow_candidate(&lower) {
                continue;
            }
            if self.is_blocked(&lower) {
                findings.blocked_link_seen = true;
            } else if seen_follow.insert(key.clone()) {
                findings.follow.push(key);
            }
        }

        findings
    }

    /// Whether a lower-cased link contains any follow keyword.
    fn is_follow_candidate(&self, lower: &str) -> bool {
        self.follow_keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }

    /// Whether a lower-cased link points at a delivery platform, either as
    /// the host right after the scheme or as an inner host label.
    pub fn is_blocked(&self, lower: &str) -> bool {
        self.blocked_keywords.iter().any(|kw| {
            lower.contains(&format!("://{kw}")) || lower.contains(&format!(".{kw}."))
        })
    }
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Strip a case-insensitive scheme prefix from an `href`.
fn strip_scheme<'a>(href: &'a str, scheme: &str) -> Option<&'a str> {
    let href = href.trim();
    let prefix = href.get(..scheme.len())?;
    if prefix.eq_ignore_ascii_case(scheme) {
        Some(href[scheme.len()..].trim())
    } else {
        None
    }
}

/// Body text without script/style/noscript content, whitespace collapsed.
fn visible_text(document: &Html) -> String {
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            text.push_str(chunk);
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
