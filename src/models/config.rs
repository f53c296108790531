//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Place;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Keyword tables used by the page extractor
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Place discovery settings
    #[serde(default)]
    pub places: PlacesConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.max_depth == 0 {
            return Err(AppError::validation("crawler.max_depth must be > 0"));
        }
        if self.crawler.sink_buffer == 0 {
            return Err(AppError::validation("crawler.sink_buffer must be > 0"));
        }
        if self.extraction.follow_keywords.is_empty() {
            return Err(AppError::validation("No follow keywords defined"));
        }
        if self.extraction.max_ordering_links == 0 {
            return Err(AppError::validation(
                "extraction.max_ordering_links must be > 0",
            ));
        }
        if self.output.path.trim().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay before each request to a site, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent requests per site
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Maximum crawl depth (the seed page is depth 1)
    #[serde(default = "defaults::max_depth")]
    pub max_depth: usize,

    /// Capacity of the queue between site crawlers and the result sink
    #[serde(default = "defaults::sink_buffer")]
    pub sink_buffer: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_depth: defaults::max_depth(),
            sink_buffer: defaults::sink_buffer(),
        }
    }
}

/// Keyword tables driving link-follow and ordering detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Path keywords that make a link worth following
    #[serde(default = "defaults::follow_keywords")]
    pub follow_keywords: Vec<String>,

    /// Delivery platforms that are never followed but prove online ordering
    #[serde(default = "defaults::blocked_keywords")]
    pub blocked_keywords: Vec<String>,

    /// Maximum ordering links kept per site
    #[serde(default = "defaults::max_ordering_links")]
    pub max_ordering_links: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            follow_keywords: defaults::follow_keywords(),
            blocked_keywords: defaults::blocked_keywords(),
            max_ordering_links: defaults::max_ordering_links(),
        }
    }
}

/// Google Places nearby-search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Environment variable holding the API key
    #[serde(default = "defaults::api_key_env")]
    pub api_key_env: String,

    #[serde(default = "defaults::latitude")]
    pub latitude: f64,

    #[serde(default = "defaults::longitude")]
    pub longitude: f64,

    /// Search radius in meters
    #[serde(default = "defaults::radius")]
    pub radius: f64,

    #[serde(default = "defaults::max_results")]
    pub max_results: u32,

    #[serde(default = "defaults::included_types")]
    pub included_types: Vec<String>,

    /// Static seed list; when non-empty the API is not queried
    #[serde(default)]
    pub seeds: Vec<Place>,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key_env: defaults::api_key_env(),
            latitude: defaults::latitude(),
            longitude: defaults::longitude(),
            radius: defaults::radius(),
            max_results: defaults::max_results(),
            included_types: defaults::included_types(),
            seeds: Vec::new(),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV file to write
    #[serde(default = "defaults::output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; silverfish/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn max_concurrent() -> usize {
        5
    }
    pub fn max_depth() -> usize {
        3
    }
    pub fn sink_buffer() -> usize {
        1
    }

    // Extraction defaults
    pub fn follow_keywords() -> Vec<String> {
        [
            "contact", "about", "location", "order", "menu", "info", "store", "pickup",
            "delivery",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn blocked_keywords() -> Vec<String> {
        [
            "ubereats",
            "uber",
            "doordash",
            "postmates",
            "grubhub",
            "toast",
            "toasttab",
            "chownow",
            "caviar",
            "delivery",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn max_ordering_links() -> usize {
        2
    }

    // Places defaults (downtown Los Angeles)
    pub fn api_key_env() -> String {
        "GOOGLE_MAPS_API_KEY".into()
    }
    pub fn latitude() -> f64 {
        34.0549
    }
    pub fn longitude() -> f64 {
        -118.2426
    }
    pub fn radius() -> f64 {
        500.0
    }
    pub fn max_results() -> u32 {
        10
    }
    pub fn included_types() -> Vec<String> {
        vec!["restaurant".into()]
    }

    pub fn output_path() -> String {
        "restaurants.csv".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_follow_keywords() {
        let mut config = Config::default();
        config.extraction.follow_keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            max_depth = 2

            [[places.seeds]]
            name = "Fat Sal's"
            website_uri = "https://www.fatsalsdeli.com/"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.max_concurrent, 5);
        assert_eq!(config.extraction.max_ordering_links, 2);
        assert!(config.extraction.blocked_keywords.contains(&"doordash".to_string()));
        assert_eq!(config.places.seeds.len(), 1);
        assert_eq!(config.output.path, "restaurants.csv");
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.crawler.user_agent, defaults::user_agent());
    }
}
