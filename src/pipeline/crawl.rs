// src/pipeline/crawl.rs

//! Restaurant crawling pipeline.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::models::{Config, Place};
use crate::services::{Metrics, MetricsSnapshot, PageExtractor, PageFetcher, SiteAggregator};
use crate::storage::{CsvSink, SinkReport};

/// Summary of one crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Places crawled
    pub sites: usize,
    /// Places without a website
    pub skipped: usize,
    pub sink: SinkReport,
    pub metrics: MetricsSnapshot,
}

/// Crawl every place with a website and write the results as CSV.
///
/// One task runs per site; all of them feed a single sink draining on a
/// blocking thread. The sink queue is closed once every site task is done.
pub async fn run_crawler<W>(
    config: &Config,
    places: Vec<Place>,
    fetcher: Arc<dyn PageFetcher>,
    writer: W,
) -> Result<CrawlSummary>
where
    W: io::Write + Send + 'static,
{
    let start_time = Utc::now();
    let sink = CsvSink::new(writer)?;

    let (tx, rx) = mpsc::channel(config.crawler.sink_buffer.max(1));
    let sink_task = tokio::task::spawn_blocking(move || sink.drain(rx));

    let extractor = Arc::new(PageExtractor::from_config(&config.extraction));
    let metrics = Arc::new(Metrics::new());

    let mut tasks = JoinSet::new();
    let mut skipped = 0;
    for place in places {
        if !place.has_website() {
            log::info!("Skipping {}: no website", place.name);
            skipped += 1;
            continue;
        }

        let aggregator = Arc::new(SiteAggregator::new(
            place.website_uri.trim(),
            Arc::clone(&extractor),
            Arc::clone(&metrics),
            tx.clone(),
        ));
        let fetcher = Arc::clone(&fetcher);
        tasks.spawn(async move { aggregator.run(fetcher.as_ref()).await });
    }

    let sites = tasks.len();
    log::info!("Crawling {sites} sites ({skipped} places without a website)");

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            log::error!("Site task aborted: {e}");
        }
    }

    // Last sender gone, the sink finishes draining and returns
    drop(tx);
    let sink_report = sink_task.await?;

    let summary = CrawlSummary {
        start_time,
        end_time: Utc::now(),
        sites,
        skipped,
        sink: sink_report,
        metrics: metrics.report(),
    };
    log::info!(
        "Crawl complete: {} rows written in {:.1}s",
        summary.sink.written,
        summary.metrics.elapsed_secs
    );
    Ok(summary)
}
