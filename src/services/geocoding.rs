/// Reverse geocoding (coordinates -> ISO country code)
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Upper-case country code for the position, `None` when the service knows none
    async fn country_code(&self, lat: f64, lng: f64) -> AppResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    country_code: Option<String>,
}

impl ReverseResponse {
    fn country_code(self) -> Option<String> {
        self.address
            .and_then(|address| address.country_code)
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
    }
}

/// Public Nominatim reverse-geocoding endpoint
///
/// The public instance allows roughly one request per second and requires an
/// identifying User-Agent; callers cache the result for hours.
#[derive(Clone)]
pub struct NominatimGeocoder {
    http_client: HttpClient,
    base_url: String,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: String, user_agent: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
        }
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn country_code(&self, lat: f64, lng: f64) -> AppResult<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT_LANGUAGE, "de,en;q=0.9")
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "3".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Reverse geocoding returned status {}",
                status
            )));
        }

        let body: ReverseResponse = response.json().await?;
        let country = body.country_code();

        tracing::info!(country = ?country, "Reverse geocoding completed");

        Ok(country)
    }
}
