// src/storage/sink.rs

//! CSV result sink.
//!
//! Drains finalized site records from the shared queue and writes one row
//! per registrable domain. The first record seen for a domain wins; later
//! ones are counted as duplicates and dropped.

use std::collections::HashSet;
use std::io;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::SiteRecord;
use crate::utils::domain::normalize_domain;

const HEADER: [&str; 4] = ["URL", "Phones", "Emails", "OrderingLinks"];
const FIELD_SEPARATOR: &str = ";";

/// Outcome of draining the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    /// Rows written after the header
    pub written: usize,
    /// Records dropped because their domain was already written
    pub duplicates: usize,
    /// Records whose row could not be written
    pub failed: usize,
}

/// Single consumer turning site records into CSV rows.
pub struct CsvSink<W: io::Write> {
    writer: csv::Writer<W>,
    seen: HashSet<String>,
    report: SinkReport,
}

impl<W: io::Write> CsvSink<W> {
    /// Wrap a writer and emit the header row.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self {
            writer,
            seen: HashSet::new(),
            report: SinkReport::default(),
        })
    }

    /// Write a record unless its domain already has a row.
    ///
    /// Returns `Ok(false)` for duplicates.
    pub fn write(&mut self, record: &SiteRecord) -> Result<bool> {
        let key = row_key(&record.url);
        if self.seen.contains(&key) {
            log::debug!("Duplicate domain {key}, dropping record for {}", record.url);
            return Ok(false);
        }

        self.writer.write_record([
            key.clone(),
            record.phone_numbers.join(FIELD_SEPARATOR),
            record.emails.join(FIELD_SEPARATOR),
            record.ordering_links.join(FIELD_SEPARATOR),
        ])?;
        self.seen.insert(key);
        Ok(true)
    }

    /// Consume records until every sender is gone, then flush.
    ///
    /// Blocks the calling thread; run it on a blocking task. Row and flush
    /// failures are logged and counted in [`SinkReport::failed`].
    pub fn drain(mut self, mut receiver: mpsc::Receiver<SiteRecord>) -> SinkReport {
        while let Some(record) = receiver.blocking_recv() {
            match self.write(&record) {
                Ok(true) => self.report.written += 1,
                Ok(false) => self.report.duplicates += 1,
                Err(e) => {
                    log::error!("Failed to write row for {}: {}", record.url, e);
                    self.report.failed += 1;
                }
            }
        }

        if let Err(e) = self.writer.flush() {
            log::error!("Failed to flush CSV output: {e}");
            self.report.failed += 1;
        }
        log::info!(
            "Sink drained: {} written, {} duplicates, {} failed",
            self.report.written,
            self.report.duplicates,
            self.report.failed
        );
        self.report
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))
    }
}

/// Dedup key and printed URL of a record: its registrable domain, or the
/// raw seed when the domain cannot be derived.
fn row_key(url: &str) -> String {
    normalize_domain(url).unwrap_or_else(|| url.to_string())
}
