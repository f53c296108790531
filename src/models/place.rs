//! Place discovery data structures.

use serde::{Deserialize, Serialize};

/// A discovered restaurant with its website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Display name of the place
    pub name: String,

    /// Website URI (may be empty when the place has none)
    #[serde(default)]
    pub website_uri: String,
}

impl Place {
    pub fn new(name: impl Into<String>, website_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website_uri: website_uri.into(),
        }
    }

    /// Whether the place has a website worth crawling.
    pub fn has_website(&self) -> bool {
        !self.website_uri.trim().is_empty()
    }
}

// --- Places API wire types ---

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircleRestriction {
    pub center: LatLng,
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationRestriction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle: Option<CircleRestriction>,
}

/// Request body for the nearby search endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_result_count: Option<u32>,
    pub location_restriction: LocationRestriction,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayName {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlace {
    #[serde(default)]
    pub display_name: DisplayName,
    #[serde(default)]
    pub website_uri: String,
}

/// Response body of the nearby search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyResponse {
    #[serde(default)]
    pub places: Vec<ApiPlace>,
}

impl From<ApiPlace> for Place {
    fn from(api: ApiPlace) -> Self {
        Self {
            name: api.display_name.text,
            website_uri: api.website_uri,
        }
    }
}
