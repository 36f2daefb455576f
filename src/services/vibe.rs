/// Mood-driven discovery ("vibe search")
///
/// A three-step selection (mood, runtime, timeframe) becomes a discover query
/// with a fixed quality floor. A random page keeps repeated searches varied and
/// a small random subset of it is shown. No results, or a failed request, fall
/// back to the head of the popular listing.
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    models::MovieSummary,
    services::catalog::{CatalogClient, DiscoverParams},
};

/// Number of movies a vibe search shows
pub const VIBE_RESULT_COUNT: usize = 6;

/// Highest page a vibe search picks from
pub const VIBE_MAX_RANDOM_PAGE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Relaxed,
    Thrilling,
    Horror,
    Love,
    Music,
    Documentary,
    Action,
}

impl Mood {
    /// TMDB genre IDs matched (any of) for the mood
    pub fn genre_ids(self) -> &'static [u32] {
        match self {
            Mood::Happy => &[35, 10751, 16],
            Mood::Relaxed => &[18, 10749, 14],
            Mood::Thrilling => &[28, 53, 80, 9648],
            Mood::Horror => &[27, 9648],
            Mood::Love => &[10749],
            Mood::Music => &[10402],
            Mood::Documentary => &[99],
            Mood::Action => &[28],
        }
    }

    fn sort_by(self) -> &'static str {
        match self {
            Mood::Documentary | Mood::Relaxed => "vote_average.desc",
            _ => "popularity.desc",
        }
    }
}

/// Runtime step of the vibe search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimePreference {
    /// Up to 40 minutes
    ShortFilm,
    /// 40 to 90 minutes
    Short,
    /// 90 to 120 minutes
    Normal,
    /// 120 minutes and more
    Extended,
    #[default]
    Any,
}

impl RuntimePreference {
    fn bounds(self) -> (Option<u32>, Option<u32>) {
        match self {
            RuntimePreference::ShortFilm => (None, Some(40)),
            RuntimePreference::Short => (Some(40), Some(90)),
            RuntimePreference::Normal => (Some(90), Some(120)),
            RuntimePreference::Extended => (Some(120), None),
            RuntimePreference::Any => (None, None),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Released in the last two years
    New,
    /// Released more than fifteen years ago
    Classic,
    #[default]
    Any,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibeSelection {
    pub mood: Option<Mood>,
    #[serde(default)]
    pub runtime: RuntimePreference,
    #[serde(default)]
    pub timeframe: Timeframe,
}

/// Discover parameters for a vibe selection on the given page.
pub fn compose_vibe_params(selection: &VibeSelection, current_year: i32, page: u32) -> DiscoverParams {
    let mut params = DiscoverParams::new().with_page(page);

    if let Some(mood) = selection.mood {
        let genres: Vec<String> = mood.genre_ids().iter().map(u32::to_string).collect();
        params.insert("with_genres", genres.join("|"));
    }

    let (min_runtime, max_runtime) = selection.runtime.bounds();
    if let Some(min) = min_runtime {
        params.insert("with_runtime.gte", min);
    }
    if let Some(max) = max_runtime {
        params.insert("with_runtime.lte", max);
    }

    params.insert("vote_average.gte", "7");
    params.insert("vote_average.lte", "9");
    params.insert("vote_count.gte", 200);

    let sort_by = selection.mood.map_or("popularity.desc", Mood::sort_by);
    params.insert("sort_by", sort_by);

    match selection.timeframe {
        Timeframe::New => {
            params.insert("primary_release_date.gte", format!("{}-01-01", current_year - 2));
        }
        Timeframe::Classic => {
            params.insert("primary_release_date.lte", format!("{}-12-31", current_year - 15));
        }
        Timeframe::Any => {}
    }

    params
}

/// Runs a vibe search and picks up to [`VIBE_RESULT_COUNT`] movies at random.
pub async fn find_by_vibes<R: Rng + ?Sized>(
    catalog: &dyn CatalogClient,
    selection: &VibeSelection,
    current_year: i32,
    rng: &mut R,
) -> Vec<MovieSummary> {
    let page = rng.gen_range(1..=VIBE_MAX_RANDOM_PAGE);
    let params = compose_vibe_params(selection, current_year, page);

    match catalog.discover_movies(&params).await {
        Ok(found) if !found.results.is_empty() => found
            .results
            .choose_multiple(rng, VIBE_RESULT_COUNT)
            .cloned()
            .collect(),
        Ok(_) => {
            tracing::info!(selection = ?selection, page, "No vibe matches, using popular fallback");
            popular_fallback(catalog).await
        }
        Err(e) => {
            tracing::warn!(selection = ?selection, error = %e, "Vibe search failed, using popular fallback");
            popular_fallback(catalog).await
        }
    }
}

async fn popular_fallback(catalog: &dyn CatalogClient) -> Vec<MovieSummary> {
    match catalog.popular_movies(1).await {
        Ok(popular) => popular
            .results
            .into_iter()
            .take(VIBE_RESULT_COUNT)
            .collect(),
        Err(e) => {
            tracing::error!(error = %e, "Popular fallback failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::Page;
    use crate::services::catalog::MockCatalogClient;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn page_of(ids: std::ops::RangeInclusive<u64>) -> Page<MovieSummary> {
        Page {
            page: 1,
            results: ids
                .map(|id| MovieSummary {
                    id,
                    title: format!("Movie {}", id),
                    poster_path: None,
                    vote_average: None,
                    genre_ids: vec![],
                    release_date: None,
                })
                .collect(),
            total_pages: 10,
            total_results: 200,
        }
    }

    #[test]
    fn test_thrilling_normal_new() {
        let selection = VibeSelection {
            mood: Some(Mood::Thrilling),
            runtime: RuntimePreference::Normal,
            timeframe: Timeframe::New,
        };
        let params = compose_vibe_params(&selection, 2025, 3);

        assert_eq!(params.get("page"), Some("3"));
        assert_eq!(params.get("with_genres"), Some("28|53|80|9648"));
        assert_eq!(params.get("with_runtime.gte"), Some("90"));
        assert_eq!(params.get("with_runtime.lte"), Some("120"));
        assert_eq!(params.get("vote_count.gte"), Some("200"));
        assert_eq!(params.get("sort_by"), Some("popularity.desc"));
        assert_eq!(params.get("primary_release_date.gte"), Some("2023-01-01"));
        assert!(!params.contains("primary_release_date.lte"));
    }

    #[test]
    fn test_documentary_classic_shortfilm() {
        let selection = VibeSelection {
            mood: Some(Mood::Documentary),
            runtime: RuntimePreference::ShortFilm,
            timeframe: Timeframe::Classic,
        };
        let params = compose_vibe_params(&selection, 2025, 1);

        assert_eq!(params.get("with_genres"), Some("99"));
        assert!(!params.contains("with_runtime.gte"));
        assert_eq!(params.get("with_runtime.lte"), Some("40"));
        assert_eq!(params.get("sort_by"), Some("vote_average.desc"));
        assert_eq!(params.get("primary_release_date.lte"), Some("2010-12-31"));
    }

    #[test]
    fn test_selection_from_wire() {
        let selection: VibeSelection =
            serde_json::from_str(r#"{"mood":"horror","runtime":"shortfilm"}"#).unwrap();
        assert_eq!(selection.mood, Some(Mood::Horror));
        assert_eq!(selection.runtime, RuntimePreference::ShortFilm);
        assert_eq!(selection.timeframe, Timeframe::Any);
    }

    #[tokio::test]
    async fn test_random_subset_from_random_page() {
        let mut mock = MockCatalogClient::new();
        mock.expect_discover_movies()
            .withf(|params| (1..=VIBE_MAX_RANDOM_PAGE).contains(&params.page()))
            .times(1)
            .returning(|_| Ok(page_of(1..=20)));
        mock.expect_popular_movies().never();

        let mut rng = StdRng::seed_from_u64(7);
        let selection = VibeSelection {
            mood: Some(Mood::Happy),
            ..Default::default()
        };
        let found = find_by_vibes(&mock, &selection, 2025, &mut rng).await;

        assert_eq!(found.len(), VIBE_RESULT_COUNT);
        let unique: HashSet<u64> = found.iter().map(|m| m.id).collect();
        assert_eq!(unique.len(), VIBE_RESULT_COUNT);
        assert!(found.iter().all(|m| (1..=20).contains(&m.id)));
    }

    #[tokio::test]
    async fn test_empty_result_falls_back_to_popular() {
        let mut mock = MockCatalogClient::new();
        mock.expect_discover_movies().returning(|_| Ok(page_of(1..=0)));
        mock.expect_popular_movies()
            .withf(|p| *p == 1)
            .times(1)
            .returning(|_| Ok(page_of(100..=120)));

        let mut rng = StdRng::seed_from_u64(1);
        let found = find_by_vibes(&mock, &VibeSelection::default(), 2025, &mut rng).await;

        let ids: Vec<u64> = found.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![100, 101, 102, 103, 104, 105]);
    }

    #[tokio::test]
    async fn test_error_falls_back_and_fallback_failure_is_empty() {
        let mut mock = MockCatalogClient::new();
        mock.expect_discover_movies()
            .returning(|_| Err(AppError::ExternalApi("500".to_string())));
        mock.expect_popular_movies()
            .returning(|_| Err(AppError::ExternalApi("500".to_string())));

        let mut rng = StdRng::seed_from_u64(1);
        let found = find_by_vibes(&mock, &VibeSelection::default(), 2025, &mut rng).await;
        assert!(found.is_empty());
    }
}
