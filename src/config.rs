use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Reverse-geocoding (Nominatim) base URL
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,

    /// User-Agent sent to the geocoding service, required by its usage policy
    #[serde(default = "default_geocode_user_agent")]
    pub geocode_user_agent: String,

    /// Redis connection URL. When unset, preferences go to a local JSON file.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Path of the JSON preference file
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Country used for provider lookups when no location is available
    #[serde(default = "default_fallback_country")]
    pub fallback_country: String,

    /// How long a resolved location stays fresh
    #[serde(default = "default_location_ttl_hours")]
    pub location_ttl_hours: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_geocode_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocode_user_agent() -> String {
    "moviefindr/0.1".to_string()
}

fn default_store_path() -> String {
    "moviefindr-prefs.json".to_string()
}

fn default_fallback_country() -> String {
    "US".to_string()
}

fn default_location_ttl_hours() -> u64 {
    12
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn location_ttl(&self) -> Duration {
        Duration::from_secs(self.location_ttl_hours.saturating_mul(60 * 60))
    }
}
