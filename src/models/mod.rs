// src/models/mod.rs

//! Domain models for the crawler application.

mod config;
mod place;
mod record;

// Re-export all public types
pub use config::{Config, CrawlerConfig, ExtractionConfig, OutputConfig, PlacesConfig};
pub use place::{
    ApiPlace, CircleRestriction, DisplayName, LatLng, LocationRestriction, NearbyRequest,
    NearbyResponse, Place,
};
pub use record::SiteRecord;
