//! Per-site extraction record.

use serde::{Deserialize, Serialize};

/// Contact information gathered from every crawled page of one site.
///
/// The sequences keep first-seen order and never hold duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Seed URL the site crawl started from
    pub url: String,

    /// Phone numbers in `XXX-XXX-XXXX` form
    pub phone_numbers: Vec<String>,

    pub emails: Vec<String>,

    /// Links that look like an online-ordering flow
    pub ordering_links: Vec<String>,

    /// Whether the site offers online ordering
    pub has_online_ordering: bool,
}

impl SiteRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a phone number unless it is already present.
    pub fn add_phone(&mut self, phone: String) -> bool {
        push_unique(&mut self.phone_numbers, phone)
    }

    /// Add an email unless it is already present.
    pub fn add_email(&mut self, email: String) -> bool {
        push_unique(&mut self.emails, email)
    }

    /// Add an ordering link while fewer than `cap` are held.
    pub fn add_ordering_link(&mut self, link: String, cap: usize) -> bool {
        if self.ordering_links.len() >= cap {
            return false;
        }
        push_unique(&mut self.ordering_links, link)
    }

    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.phone_numbers.is_empty() && self.emails.is_empty() && self.ordering_links.is_empty()
    }
}

fn push_unique(items: &mut Vec<String>, item: String) -> bool {
    if items.contains(&item) {
        return false;
    }
    items.push(item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_phone_dedup_keeps_order() {
        let mut record = SiteRecord::new("https://example.com");
        assert!(record.add_phone("949-555-1212".into()));
        assert!(record.add_phone("310-555-0000".into()));
        assert!(!record.add_phone("949-555-1212".into()));
        assert_eq!(record.phone_numbers, vec!["949-555-1212", "310-555-0000"]);
    }

    #[test]
    fn test_ordering_link_cap() {
        let mut record = SiteRecord::new("https://example.com");
        for i in 0..5 {
            record.add_ordering_link(format!("https://example.com/order/{i}"), 2);
        }
        assert_eq!(
            record.ordering_links,
            vec!["https://example.com/order/0", "https://example.com/order/1"]
        );
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = SiteRecord::new("https://example.com");
        assert!(record.is_empty());
        assert!(!record.has_online_ordering);
    }
}
