use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod filters;
pub mod location;
pub mod settings;

pub use filters::{Category, FilterEditor, FilterKey, FilterOutcome, FilterState, FilterValue};
pub use location::{Coords, LocPermission, LocationState};
pub use settings::{Settings, SettingsPatch};

/// Remote-assigned TMDB movie identifier
pub type MovieId = u64;

/// Highest page number the catalog API will serve
pub const MAX_REMOTE_PAGE: u32 = 500;

/// Movie as it appears in list responses
///
/// Rebuilt from every response and never persisted; only IDs are stored locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: MovieId,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// One page of a paginated catalog response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

/// Subset of the movie detail payload used by the library screens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub overview: Option<String>,
}

/// Compact entry for favorites and history lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieCard {
    pub id: MovieId,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
}

impl From<MovieDetails> for MovieCard {
    fn from(details: MovieDetails) -> Self {
        MovieCard {
            id: details.id,
            title: details.title.or(details.name),
            poster_path: details.poster_path,
            vote_average: details.vote_average,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

// ============================================================================
// Watch providers
// ============================================================================

/// Maximum number of providers shown per movie
pub const MAX_DISPLAYED_PROVIDERS: usize = 5;

/// A streaming or rental service offering a movie in one country
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub provider_id: u32,
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub display_priority: Option<u32>,
}

/// Offers for one country, split by monetization type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CountryProviders {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Option<Vec<Provider>>,
    #[serde(default)]
    pub rent: Option<Vec<Provider>>,
    #[serde(default)]
    pub buy: Option<Vec<Provider>>,
}

impl CountryProviders {
    /// Subscription offers when there are any, otherwise rentals
    pub fn offers(&self) -> &[Provider] {
        match (&self.flatrate, &self.rent) {
            (Some(flatrate), _) if !flatrate.is_empty() => flatrate.as_slice(),
            (_, Some(rent)) => rent.as_slice(),
            _ => &[],
        }
    }
}

/// Provider lookup response, keyed by ISO country code
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatchProviders {
    #[serde(default)]
    pub id: Option<MovieId>,
    #[serde(default)]
    pub results: BTreeMap<String, CountryProviders>,
}

impl WatchProviders {
    /// Offers available in exactly this country
    pub fn offers_in(&self, country: &str) -> &[Provider] {
        self.results
            .get(&country.to_uppercase())
            .map(CountryProviders::offers)
            .unwrap_or(&[])
    }

    /// Providers to display for a movie: the country's offers, or the first
    /// country's when the response has nothing for it. Capped for display.
    pub fn display_offers(&self, country: &str) -> Vec<Provider> {
        let country_data = self
            .results
            .get(&country.to_uppercase())
            .or_else(|| self.results.values().next());

        country_data
            .map(|data| {
                data.offers()
                    .iter()
                    .take(MAX_DISPLAYED_PROVIDERS)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(id: u32, name: &str) -> serde_json::Value {
        json!({ "provider_id": id, "provider_name": name, "logo_path": "/x.png" })
    }

    #[test]
    fn test_movie_summary_tolerates_sparse_payload() {
        let movie: MovieSummary = serde_json::from_value(json!({ "id": 603 })).unwrap();
        assert_eq!(movie.id, 603);
        assert_eq!(movie.title, "");
        assert!(movie.genre_ids.is_empty());
        assert_eq!(movie.vote_average, None);
    }

    #[test]
    fn test_page_defaults() {
        let page: Page<MovieSummary> =
            serde_json::from_value(json!({ "results": [{ "id": 1, "title": "A" }] })).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.results[0].title, "A");
    }

    #[test]
    fn test_card_prefers_title_over_name() {
        let details: MovieDetails = serde_json::from_value(json!({
            "id": 7, "name": "Series Name", "vote_average": 6.5
        }))
        .unwrap();
        let card = MovieCard::from(details);
        assert_eq!(card.title.as_deref(), Some("Series Name"));
        assert_eq!(card.vote_average, Some(6.5));
    }

    #[test]
    fn test_offers_prefer_flatrate_then_rent() {
        let providers: WatchProviders = serde_json::from_value(json!({
            "id": 550,
            "results": {
                "DE": { "flatrate": [provider(8, "Netflix")], "rent": [provider(2, "Apple TV")] },
                "US": { "rent": [provider(3, "Google Play")] },
                "FR": { "flatrate": [], "buy": [provider(10, "Amazon")] }
            }
        }))
        .unwrap();

        assert_eq!(providers.offers_in("de")[0].provider_name, "Netflix");
        assert_eq!(providers.offers_in("US")[0].provider_name, "Google Play");
        assert!(providers.offers_in("FR").is_empty());
        assert!(providers.offers_in("AT").is_empty());
    }

    #[test]
    fn test_display_offers_fall_back_to_first_country_and_cap() {
        let many: Vec<_> = (1..=8).map(|i| provider(i, "P")).collect();
        let providers: WatchProviders = serde_json::from_value(json!({
            "results": { "CA": { "flatrate": many } }
        }))
        .unwrap();

        let shown = providers.display_offers("US");
        assert_eq!(shown.len(), MAX_DISPLAYED_PROVIDERS);
        assert_eq!(shown[0].provider_id, 1);
        assert!(WatchProviders::default().display_offers("US").is_empty());
    }
}
