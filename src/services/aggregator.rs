// src/services/aggregator.rs

//! Per-site crawl aggregation.
//!
//! One [`SiteAggregator`] exists per seed URL. It counts in-flight page
//! requests, folds every page's findings into a single [`SiteRecord`] and
//! hands that record to the result sink exactly once, when the last
//! request has resolved.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::models::SiteRecord;
use crate::services::extractor::PageExtractor;
use crate::services::fetcher::{PageEvent, PageEventHandler, PageFetcher};
use crate::services::metrics::Metrics;

/// Lifecycle of a site crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteState {
    /// Requests may be in flight, nothing emitted yet
    Active,
    /// The record has been emitted; permanent
    Done,
}

/// In-flight counter, emission flag and the record they protect.
#[derive(Debug)]
struct PendingState {
    pending: usize,
    state: SiteState,
    record: SiteRecord,
}

impl PendingState {
    /// Move to `Done` and snapshot the record when nothing is in flight.
    ///
    /// Returns `None` while requests are pending or once already done.
    fn try_finalize(&mut self) -> Option<SiteRecord> {
        if self.pending != 0 || self.state == SiteState::Done {
            return None;
        }
        self.state = SiteState::Done;

        let mut snapshot = self.record.clone();
        if !snapshot.ordering_links.is_empty() {
            snapshot.has_online_ordering = true;
        }
        Some(snapshot)
    }
}

/// Coordinates all page fetches of one site into one record.
pub struct SiteAggregator {
    seed: String,
    extractor: Arc<PageExtractor>,
    metrics: Arc<Metrics>,
    sink: mpsc::Sender<SiteRecord>,
    state: Mutex<PendingState>,
    // Separate from `state`; never held while the fetcher is called
    visited: Mutex<HashSet<String>>,
}

impl SiteAggregator {
    pub fn new(
        seed: impl Into<String>,
        extractor: Arc<PageExtractor>,
        metrics: Arc<Metrics>,
        sink: mpsc::Sender<SiteRecord>,
    ) -> Self {
        let seed = seed.into();
        Self {
            state: Mutex::new(PendingState {
                pending: 0,
                state: SiteState::Active,
                record: SiteRecord::new(seed.clone()),
            }),
            visited: Mutex::new(HashSet::new()),
            seed,
            extractor,
            metrics,
            sink,
        }
    }

    pub fn state(&self) -> SiteState {
        self.lock_state().state
    }

    /// Number of requests currently in flight.
    pub fn pending(&self) -> usize {
        self.lock_state().pending
    }

    /// Crawl the site with `fetcher` and make sure its record is emitted.
    pub async fn run(self: Arc<Self>, fetcher: &dyn PageFetcher) {
        self.metrics.domain_started();
        log::info!("Crawling {}", self.seed);

        let handler: Arc<dyn PageEventHandler> = self.clone();
        if let Err(e) = fetcher.crawl(&self.seed, handler).await {
            log::warn!("Visit failed for {}: {}", self.seed, e);
        }

        // The fetcher has returned, so nothing can still be in flight
        let snapshot = {
            let mut state = self.lock_state();
            if state.pending != 0 {
                log::warn!(
                    "{} requests never resolved for {}",
                    state.pending,
                    self.seed
                );
                state.pending = 0;
            }
            state.try_finalize()
        };
        self.emit(snapshot).await;
    }

    fn on_started(&self, url: &str) {
        self.lock_state().pending += 1;
        self.metrics.request_started();
        log::debug!("Requesting {url}");
    }

    /// Settle one request and snapshot the record if it was the last one.
    fn on_settled(&self, ok: bool) -> Option<SiteRecord> {
        let mut state = self.lock_state();
        state.pending = state.pending.saturating_sub(1);
        if ok {
            self.metrics.request_ok();
        } else {
            self.metrics.request_errored();
        }
        state.try_finalize()
    }

    /// Fold a page into the record and return the links to follow.
    fn on_page(&self, url: &str, body: &str) -> Vec<String> {
        let Ok(base) = Url::parse(url) else {
            log::warn!("Unparseable page URL {url}");
            return Vec::new();
        };

        let findings = self.extractor.extract(body, &base);
        {
            let mut state = self.lock_state();
            findings.apply_to(&mut state.record, self.extractor.max_ordering_links());
        }

        let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
        findings
            .follow
            .into_iter()
            .filter(|link| visited.insert(link.clone()))
            .collect()
    }

    /// Hand a finalized record to the sink. Must be called without locks.
    async fn emit(&self, snapshot: Option<SiteRecord>) {
        let Some(record) = snapshot else {
            return;
        };

        log::info!(
            "Finished {}: {} phones, {} emails, {} ordering links, online ordering: {}",
            record.url,
            record.phone_numbers.len(),
            record.emails.len(),
            record.ordering_links.len(),
            record.has_online_ordering
        );

        if let Err(e) = self.sink.send(record.clone()).await {
            log::error!("Result sink closed, dropping record for {}: {}", self.seed, e);
        }
        self.metrics.domain_finished(&record);
    }

    fn lock_state(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PageEventHandler for SiteAggregator {
    async fn handle(&self, event: PageEvent) -> Vec<String> {
        match event {
            PageEvent::Started { url } => {
                self.on_started(&url);
                Vec::new()
            }
            PageEvent::Fetched { url, body } => self.on_page(&url, &body),
            PageEvent::Failed { url, status, error } => {
                log::debug!("Request errored url={url} status={status:?}: {error}");
                let snapshot = self.on_settled(false);
                self.emit(snapshot).await;
                Vec::new()
            }
            PageEvent::Completed { url } => {
                log::debug!("Done crawling {url}");
                let snapshot = self.on_settled(true);
                self.emit(snapshot).await;
                Vec::new()
            }
        }
    }
}
