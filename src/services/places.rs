// src/services/places.rs

//! Place discovery.
//!
//! Seeds the crawl with restaurant websites, either from the Google Places
//! nearby-search API or from a static list in the configuration.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{
    CircleRestriction, LatLng, LocationRestriction, NearbyRequest, NearbyResponse, Place,
    PlacesConfig,
};

const NEARBY_SEARCH_URL: &str = "https://places.googleapis.com/v1/places:searchNearby";
const FIELD_MASK: &str = "places.displayName,places.websiteUri";

/// Source of places to crawl.
#[async_trait]
pub trait PlaceSource: Send + Sync {
    async fn fetch_places(&self) -> Result<Vec<Place>>;
}

/// Fixed list of places, typically from the configuration file.
#[derive(Debug, Clone, Default)]
pub struct StaticPlaces {
    places: Vec<Place>,
}

impl StaticPlaces {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }
}

#[async_trait]
impl PlaceSource for StaticPlaces {
    async fn fetch_places(&self) -> Result<Vec<Place>> {
        Ok(self.places.clone())
    }
}

/// Client for the Google Places nearby-search endpoint.
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    endpoint: String,
    request: NearbyRequest,
}

impl GooglePlacesClient {
    /// Create a client searching around the configured location.
    pub fn new(api_key: impl Into<String>, config: &PlacesConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::config(format!(
                "{} is not set",
                config.api_key_env
            )));
        }

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: NEARBY_SEARCH_URL.to_string(),
            request: Self::build_request(config),
        })
    }

    /// Point the client at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_request(config: &PlacesConfig) -> NearbyRequest {
        NearbyRequest {
            included_types: config.included_types.clone(),
            max_result_count: (config.max_results > 0).then_some(config.max_results),
            location_restriction: LocationRestriction {
                circle: Some(CircleRestriction {
                    center: LatLng {
                        latitude: config.latitude,
                        longitude: config.longitude,
                    },
                    radius: config.radius,
                }),
            },
        }
    }
}

#[async_trait]
impl PlaceSource for GooglePlacesClient {
    async fn fetch_places(&self) -> Result<Vec<Place>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&self.request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AppError::places(format!(
                "non-200 response: {}, body: {}",
                status.as_u16(),
                body
            )));
        }

        let response: NearbyResponse = serde_json::from_str(&body)?;
        let places: Vec<Place> = response.places.into_iter().map(Place::from).collect();
        log::info!("Places API returned {} places", places.len());
        Ok(places)
    }
}

/// Pick the place source for a configuration.
///
/// Configured seeds win; otherwise the API key is read from the configured
/// environment variable.
pub fn place_source(config: &PlacesConfig) -> Result<Box<dyn PlaceSource>> {
    if !config.seeds.is_empty() {
        log::info!("Using {} configured seed places", config.seeds.len());
        return Ok(Box::new(StaticPlaces::new(config.seeds.clone())));
    }

    let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
    Ok(Box::new(GooglePlacesClient::new(api_key, config)?))
}
