/// TMDB v3 catalog binding
///
/// Every request carries the API key and `include_adult=false`. Discover requests
/// only forward the parameter keys TMDB's discover endpoint understands.
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{
        Genre, GenreList, MovieDetails, MovieId, MovieSummary, Page, WatchProviders,
        MAX_REMOTE_PAGE,
    },
    services::catalog::{CatalogClient, DiscoverParams, TrendingWindow},
};

/// Discover parameters forwarded to the API; anything else is dropped
pub const DISCOVER_PARAM_KEYS: [&str; 12] = [
    "with_genres",
    "sort_by",
    "with_cast",
    "with_crew",
    "vote_average.gte",
    "vote_average.lte",
    "vote_count.gte",
    "with_runtime.gte",
    "with_runtime.lte",
    "primary_release_date.gte",
    "primary_release_date.lte",
    "with_original_language",
];

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn base_query(&self) -> Vec<(String, String)> {
        vec![
            ("api_key".to_string(), self.api_key.clone()),
            ("include_adult".to_string(), "false".to_string()),
        ]
    }

    fn paged_query(&self, page: u32) -> Vec<(String, String)> {
        let mut query = self.base_query();
        query.push(("page".to_string(), clamp_page(page).to_string()));
        query
    }

    /// Query pairs for a discover request: base pairs, page, whitelisted keys
    fn discover_query(&self, params: &DiscoverParams) -> Vec<(String, String)> {
        let mut query = self.paged_query(params.page());
        query.extend(
            params
                .iter()
                .filter(|(key, _)| DISCOVER_PARAM_KEYS.contains(key))
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
        query
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self.http_client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {} for {}: {}",
                status, path, body
            )));
        }

        Ok(response.json().await?)
    }
}

fn clamp_page(page: u32) -> u32 {
    page.clamp(1, MAX_REMOTE_PAGE)
}

#[async_trait::async_trait]
impl CatalogClient for TmdbClient {
    async fn search_movies(&self, query: &str, page: u32) -> AppResult<Page<MovieSummary>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let mut params = self.paged_query(page);
        params.push(("query".to_string(), query.trim().to_string()));

        let results: Page<MovieSummary> = self.get_json("/search/movie", &params).await?;

        tracing::info!(
            query = %query,
            page = results.page,
            results = results.results.len(),
            client = "tmdb",
            "Title search completed"
        );

        Ok(results)
    }

    async fn discover_movies(&self, params: &DiscoverParams) -> AppResult<Page<MovieSummary>> {
        let query = self.discover_query(params);
        let results: Page<MovieSummary> = self.get_json("/discover/movie", &query).await?;

        tracing::info!(
            page = results.page,
            total_pages = results.total_pages,
            results = results.results.len(),
            client = "tmdb",
            "Discover query completed"
        );

        Ok(results)
    }

    async fn popular_movies(&self, page: u32) -> AppResult<Page<MovieSummary>> {
        self.get_json("/movie/popular", &self.paged_query(page)).await
    }

    async fn top_rated_movies(&self, page: u32) -> AppResult<Page<MovieSummary>> {
        self.get_json("/movie/top_rated", &self.paged_query(page))
            .await
    }

    async fn trending_movies(
        &self,
        window: TrendingWindow,
        page: u32,
    ) -> AppResult<Page<MovieSummary>> {
        let path = format!("/trending/movie/{}", window);
        self.get_json(&path, &self.paged_query(page)).await
    }

    async fn movie_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        let path = format!("/movie/{}", id);
        self.get_json(&path, &self.base_query()).await
    }

    async fn watch_providers(&self, id: MovieId) -> AppResult<WatchProviders> {
        let path = format!("/movie/{}/watch/providers", id);
        let providers: WatchProviders = self.get_json(&path, &self.base_query()).await?;

        tracing::debug!(
            movie_id = id,
            countries = providers.results.len(),
            "Watch providers fetched"
        );

        Ok(providers)
    }

    async fn movie_genres(&self) -> AppResult<Vec<Genre>> {
        let list: GenreList = self
            .get_json("/genre/movie/list", &self.base_query())
            .await?;
        Ok(list.genres)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_client() -> TmdbClient {
        TmdbClient::new("test_key".to_string(), "http://test.local/3/".to_string())
    }

    fn value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(create_test_client().api_url, "http://test.local/3");
    }

    #[test]
    fn test_paged_query_includes_key_and_adult_flag() {
        let query = create_test_client().paged_query(3);
        assert_eq!(value(&query, "api_key"), Some("test_key"));
        assert_eq!(value(&query, "include_adult"), Some("false"));
        assert_eq!(value(&query, "page"), Some("3"));
    }

    #[test]
    fn test_page_is_clamped_to_remote_limit() {
        assert_eq!(clamp_page(0), 1);
        assert_eq!(clamp_page(501), MAX_REMOTE_PAGE);
        assert_eq!(clamp_page(42), 42);
    }

    #[test]
    fn test_discover_query_drops_unknown_keys() {
        let mut params = DiscoverParams::new().with_page(2);
        params.insert("with_runtime.gte", 90);
        params.insert("sort_by", "popularity.desc");
        params.insert("certification_country", "DE");
        params.insert("include_adult", true);

        let query = create_test_client().discover_query(&params);

        assert_eq!(value(&query, "page"), Some("2"));
        assert_eq!(value(&query, "with_runtime.gte"), Some("90"));
        assert_eq!(value(&query, "sort_by"), Some("popularity.desc"));
        assert_eq!(value(&query, "certification_country"), None);
        assert_eq!(value(&query, "include_adult"), Some("false"));
        assert_eq!(query.iter().filter(|(k, _)| k == "include_adult").count(), 1);
    }

    #[tokio::test]
    async fn test_empty_search_rejected_without_request() {
        let result = create_test_client().search_movies("   ", 1).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
