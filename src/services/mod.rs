//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Place discovery (`PlaceSource`, `GooglePlacesClient`)
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Contact extraction (`PageExtractor`)
//! - Per-site aggregation (`SiteAggregator`)
//! - Crawl counters (`Metrics`)

pub mod aggregator;
pub mod extractor;
pub mod fetcher;
pub mod metrics;
pub mod places;

pub use aggregator::{SiteAggregator, SiteState};
pub use extractor::{PageExtractor, PageFindings};
pub use fetcher::{HttpFetcher, PageEvent, PageEventHandler, PageFetcher};
pub use metrics::{Metrics, MetricsSnapshot};
pub use places::{GooglePlacesClient, PlaceSource, StaticPlaces, place_source};
