/// Remote movie catalog abstraction
///
/// The list controller, the library loaders and mood search only talk to this
/// trait. The TMDB binding is the one real implementation; tests substitute mocks.
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::{
    error::AppResult,
    models::{Genre, MovieDetails, MovieId, MovieSummary, Page, WatchProviders},
};

pub mod tmdb;

pub use tmdb::TmdbClient;

/// Flat, already-normalized query parameters for a discover request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverParams(BTreeMap<String, String>);

impl DiscoverParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn page(&self) -> u32 {
        self.get("page").and_then(|p| p.parse().ok()).unwrap_or(1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.insert("page", page);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingWindow {
    Day,
    Week,
}

impl Display for TrendingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendingWindow::Day => write!(f, "day"),
            TrendingWindow::Week => write!(f, "week"),
        }
    }
}

/// Trait for the paginated movie metadata service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Full-text title search
    async fn search_movies(&self, query: &str, page: u32) -> AppResult<Page<MovieSummary>>;

    /// Filtered discovery listing, parameters as produced by the query composer
    async fn discover_movies(&self, params: &DiscoverParams) -> AppResult<Page<MovieSummary>>;

    async fn popular_movies(&self, page: u32) -> AppResult<Page<MovieSummary>>;

    async fn top_rated_movies(&self, page: u32) -> AppResult<Page<MovieSummary>>;

    async fn trending_movies(
        &self,
        window: TrendingWindow,
        page: u32,
    ) -> AppResult<Page<MovieSummary>>;

    async fn movie_details(&self, id: MovieId) -> AppResult<MovieDetails>;

    /// Streaming/rental offers per country for one movie
    async fn watch_providers(&self, id: MovieId) -> AppResult<WatchProviders>;

    async fn movie_genres(&self) -> AppResult<Vec<Genre>>;

    /// Client name for logging
    fn name(&self) -> &'static str;
}
