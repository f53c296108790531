//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Crawl restaurant websites and write the CSV report

pub mod crawl;

pub use crawl::{CrawlSummary, run_crawler};
