// src/services/metrics.rs

//! Process-wide crawl counters.
//!
//! Counters are independent atomics; reads are eventually consistent and
//! no ordering between them is implied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::SiteRecord;

/// Crawl counters shared by every site aggregator.
#[derive(Debug)]
pub struct Metrics {
    started_at: DateTime<Utc>,
    started: Instant,

    domains_started: AtomicU64,
    domains_finished: AtomicU64,
    domains_with_email: AtomicU64,
    domains_with_phone: AtomicU64,
    domains_with_ordering: AtomicU64,

    requests_started: AtomicU64,
    requests_ok: AtomicU64,
    requests_errored: AtomicU64,

    emails_found: AtomicU64,
    phones_found: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub domains_started: u64,
    pub domains_finished: u64,
    pub domains_with_email: u64,
    pub domains_with_phone: u64,
    pub domains_with_ordering: u64,
    pub requests_started: u64,
    pub requests_ok: u64,
    pub requests_errored: u64,
    pub emails_found: u64,
    pub phones_found: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            domains_started: AtomicU64::new(0),
            domains_finished: AtomicU64::new(0),
            domains_with_email: AtomicU64::new(0),
            domains_with_phone: AtomicU64::new(0),
            domains_with_ordering: AtomicU64::new(0),
            requests_started: AtomicU64::new(0),
            requests_ok: AtomicU64::new(0),
            requests_errored: AtomicU64::new(0),
            emails_found: AtomicU64::new(0),
            phones_found: AtomicU64::new(0),
        }
    }

    pub fn domain_started(&self) {
        self.domains_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_started(&self) {
        self.requests_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_ok(&self) {
        self.requests_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_errored(&self) {
        self.requests_errored.fetch_add(1, Ordering::Relaxed);
    }

    /// Account for a finalized site record.
    pub fn domain_finished(&self, record: &SiteRecord) {
        self.domains_finished.fetch_add(1, Ordering::Relaxed);
        if !record.emails.is_empty() {
            self.domains_with_email.fetch_add(1, Ordering::Relaxed);
        }
        if !record.phone_numbers.is_empty() {
            self.domains_with_phone.fetch_add(1, Ordering::Relaxed);
        }
        if record.has_online_ordering {
            self.domains_with_ordering.fetch_add(1, Ordering::Relaxed);
        }
        self.emails_found
            .fetch_add(record.emails.len() as u64, Ordering::Relaxed);
        self.phones_found
            .fetch_add(record.phone_numbers.len() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started_at: self.started_at,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            domains_started: self.domains_started.load(Ordering::Relaxed),
            domains_finished: self.domains_finished.load(Ordering::Relaxed),
            domains_with_email: self.domains_with_email.load(Ordering::Relaxed),
            domains_with_phone: self.domains_with_phone.load(Ordering::Relaxed),
            domains_with_ordering: self.domains_with_ordering.load(Ordering::Relaxed),
            requests_started: self.requests_started.load(Ordering::Relaxed),
            requests_ok: self.requests_ok.load(Ordering::Relaxed),
            requests_errored: self.requests_errored.load(Ordering::Relaxed),
            emails_found: self.emails_found.load(Ordering::Relaxed),
            phones_found: self.phones_found.load(Ordering::Relaxed),
        }
    }

    /// Log a run summary.
    pub fn report(&self) -> MetricsSnapshot {
        let snap = self.snapshot();
        log::info!(
            "Domains: {} started, {} finished ({} with email, {} with phone, {} with online ordering)",
            snap.domains_started,
            snap.domains_finished,
            snap.domains_with_email,
            snap.domains_with_phone,
            snap.domains_with_ordering
        );
        log::info!(
            "Requests: {} started, {} ok, {} errored",
            snap.requests_started,
            snap.requests_ok,
            snap.requests_errored
        );
        log::info!(
            "Found {} emails and {} phone numbers in {:.1}s",
            snap.emails_found,
            snap.phones_found,
            snap.elapsed_secs
        );
        snap
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_finished_counts() {
        let metrics = Metrics::new();
        let mut record = SiteRecord::new("https://example.com");
        record.add_phone("949-555-1212".into());
        record.add_phone("310-555-0199".into());
        record.has_online_ordering = true;
        metrics.domain_finished(&record);
        metrics.domain_finished(&SiteRecord::new("https://empty.com"));

        let snap = metrics.snapshot();
        assert_eq!(snap.domains_finished, 2);
        assert_eq!(snap.domains_with_phone, 1);
        assert_eq!(snap.domains_with_email, 0);
        assert_eq!(snap.domains_with_ordering, 1);
        assert_eq!(snap.phones_found, 2);
    }

    #[test]
    fn test_request_counters() {
        let metrics = Metrics::new();
        metrics.request_started();
        metrics.request_started();
        metrics.request_ok();
        metrics.request_errored();

        let snap = metrics.report();
        assert_eq!(snap.requests_started, 2);
        assert_eq!(snap.requests_ok, 1);
        assert_eq!(snap.requests_errored, 1);
    }
}
