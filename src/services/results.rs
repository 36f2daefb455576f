/// Paged result list with infinite-scroll continuation
///
/// The controller owns one list: the query that produced it, the page cursor,
/// the accumulated (locally filtered) movies, and the provider data resolved for
/// them. Fetch failures never escape; they are logged and the list keeps its
/// previous state.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        Category, FilterOutcome, FilterState, MovieId, MovieSummary, Page, Provider,
        WatchProviders, MAX_REMOTE_PAGE,
    },
    services::{
        catalog::{CatalogClient, TrendingWindow},
        preferences::PreferenceStore,
        query_composer::compose_discover_params,
        watch_providers::{fetch_providers, is_visible, ProviderFilter},
    },
};

/// What a list shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    Search(String),
    Discover {
        category: Option<Category>,
        genre_id: Option<String>,
    },
    Popular,
    TopRated,
    Trending(TrendingWindow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    Loading,
    Loaded,
    LoadingMore,
    Exhausted,
}

/// Answer to an infinite-scroll trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSignal {
    /// The continuation is finished; the trigger may fire again
    Complete,
    /// No more pages; the trigger should be disabled
    Disable,
}

/// Drops watched movies (unless `hideWatched` is off) and, with
/// `favoritesOnly`, everything that is not a favorite.
///
/// A page can shrink below its nominal size; nothing re-fetches to fill it.
pub fn apply_local_user_filters(
    results: Vec<MovieSummary>,
    filters: &FilterState,
    watched: &HashSet<MovieId>,
    favorites: &HashSet<MovieId>,
) -> Vec<MovieSummary> {
    let hide_watched = filters.hide_watched();
    let favorites_only = filters.favorites_only();

    results
        .into_iter()
        .filter(|movie| !(hide_watched && watched.contains(&movie.id)))
        .filter(|movie| !favorites_only || favorites.contains(&movie.id))
        .collect()
}

pub struct ResultListController {
    catalog: Arc<dyn CatalogClient>,
    preferences: PreferenceStore,
    query: ListQuery,
    filters: FilterState,
    phase: ListPhase,
    current_page: u32,
    total_pages: u32,
    results: Vec<MovieSummary>,
    providers: HashMap<MovieId, WatchProviders>,
    provider_filter: ProviderFilter,
    country: String,
    visible: Vec<MovieId>,
}

impl ResultListController {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        preferences: PreferenceStore,
        country: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            preferences,
            query: ListQuery::Popular,
            filters: FilterState::new(),
            phase: ListPhase::Idle,
            current_page: 1,
            total_pages: 1,
            results: Vec::new(),
            providers: HashMap::new(),
            provider_filter: ProviderFilter::default(),
            country: country.into().to_uppercase(),
            visible: Vec::new(),
        }
    }

    pub fn phase(&self) -> ListPhase {
        self.phase
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Every accumulated movie, after local filters, before provider visibility
    pub fn results(&self) -> &[MovieSummary] {
        &self.results
    }

    /// Accumulated movies that pass the provider visibility rule
    pub fn visible_results(&self) -> Vec<&MovieSummary> {
        let by_id: HashMap<MovieId, &MovieSummary> =
            self.results.iter().map(|m| (m.id, m)).collect();
        self.visible
            .iter()
            .filter_map(|id| by_id.get(id).copied())
            .collect()
    }

    /// Providers to show on a movie's card; `None` while unresolved
    pub fn display_providers(&self, id: MovieId) -> Option<Vec<Provider>> {
        self.providers
            .get(&id)
            .map(|providers| providers.display_offers(&self.country))
    }

    /// Starts a new list: clears accumulated results and loads page 1.
    pub async fn select(&mut self, query: ListQuery) {
        self.query = query;
        self.results.clear();
        self.providers.clear();
        self.visible.clear();
        self.current_page = 1;
        self.total_pages = 1;
        self.phase = ListPhase::Loading;

        let page = match self.fetch_first_page().await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(
                    query = ?self.query,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to load result list"
                );
                self.phase = ListPhase::Idle;
                return;
            }
        };

        self.total_pages = clamp_total_pages(page.total_pages, self.current_page);
        self.results = self.local_filter(page.results).await;
        self.recompute_visibility();
        self.phase = ListPhase::Loaded;

        tracing::info!(
            query = ?self.query,
            total_pages = self.total_pages,
            results = self.results.len(),
            "Result list loaded"
        );
    }

    /// Reloads page 1 of the current query.
    pub async fn reload(&mut self) {
        let query = self.query.clone();
        self.select(query).await;
    }

    /// Takes the outcome of a filter editing session; an applied selection
    /// replaces the current one and reloads the list.
    pub async fn apply_filters(&mut self, outcome: FilterOutcome) {
        match outcome {
            FilterOutcome::Applied(filters) => {
                self.filters = filters;
                self.reload().await;
            }
            FilterOutcome::Cancelled => {}
        }
    }

    /// Infinite-scroll continuation.
    ///
    /// Fetches the next page when one exists and appends it. On the last page it
    /// marks the list exhausted without any request. A failed fetch leaves the
    /// list as it was and still completes the signal.
    pub async fn load_more(&mut self) -> ScrollSignal {
        match self.phase {
            ListPhase::Loaded => {}
            ListPhase::Exhausted => return ScrollSignal::Disable,
            _ => return ScrollSignal::Complete,
        }

        if self.current_page >= self.total_pages {
            self.phase = ListPhase::Exhausted;
            tracing::debug!(page = self.current_page, "Result list exhausted");
            return ScrollSignal::Disable;
        }

        self.phase = ListPhase::LoadingMore;
        let next_page = self.current_page + 1;

        let fetched = self.fetch_page(&self.query, next_page).await;
        match fetched {
            Ok(page) => {
                self.current_page = next_page;
                self.total_pages = clamp_total_pages(page.total_pages, self.current_page);

                let known: HashSet<MovieId> = self.results.iter().map(|m| m.id).collect();
                let fresh: Vec<MovieSummary> = self
                    .local_filter(page.results)
                    .await
                    .into_iter()
                    .filter(|m| !known.contains(&m.id))
                    .collect();

                tracing::info!(page = next_page, appended = fresh.len(), "Next page loaded");
                self.results.extend(fresh);
                self.recompute_visibility();
            }
            Err(e) => {
                tracing::error!(
                    page = next_page,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to load next page"
                );
            }
        }

        self.phase = ListPhase::Loaded;
        ScrollSignal::Complete
    }

    /// Resolves providers for every accumulated movie that has none yet.
    pub async fn resolve_providers(&mut self) {
        let pending: Vec<MovieId> = self
            .results
            .iter()
            .map(|m| m.id)
            .filter(|id| !self.providers.contains_key(id))
            .collect();

        if pending.is_empty() {
            return;
        }

        for (id, providers) in fetch_providers(Arc::clone(&self.catalog), pending).await {
            self.providers.insert(id, providers);
        }
        self.recompute_visibility();
    }

    /// Records one movie's provider data as it arrives.
    pub fn record_providers(&mut self, id: MovieId, providers: WatchProviders) {
        self.providers.insert(id, providers);
        self.recompute_visibility();
    }

    pub fn set_provider_filter(&mut self, filter: ProviderFilter) {
        self.provider_filter = filter;
        self.recompute_visibility();
    }

    pub fn set_country(&mut self, country: &str) {
        self.country = country.to_uppercase();
        self.recompute_visibility();
    }

    fn recompute_visibility(&mut self) {
        self.visible = self
            .results
            .iter()
            .filter(|m| {
                is_visible(
                    self.providers.get(&m.id),
                    &self.provider_filter,
                    &self.country,
                )
            })
            .map(|m| m.id)
            .collect();
    }

    /// Page 1 of the current query, broadening an empty discover result to the
    /// popular listing.
    async fn fetch_first_page(&mut self) -> AppResult<Page<MovieSummary>> {
        let page = self.fetch_page(&self.query, 1).await?;

        if page.results.is_empty() && matches!(self.query, ListQuery::Discover { .. }) {
            tracing::info!(query = ?self.query, "No results, falling back to popular listing");
            self.query = ListQuery::Popular;
            return self.fetch_page(&ListQuery::Popular, 1).await;
        }

        Ok(page)
    }

    async fn fetch_page(&self, query: &ListQuery, page: u32) -> AppResult<Page<MovieSummary>> {
        match query {
            ListQuery::Search(text) => self.catalog.search_movies(text, page).await,
            ListQuery::Discover { category, genre_id } => {
                let params = compose_discover_params(
                    &self.filters,
                    category.as_ref(),
                    genre_id.as_deref(),
                    page,
                );
                self.catalog.discover_movies(&params).await
            }
            ListQuery::Popular => self.catalog.popular_movies(page).await,
            ListQuery::TopRated => self.catalog.top_rated_movies(page).await,
            ListQuery::Trending(window) => self.catalog.trending_movies(*window, page).await,
        }
    }

    async fn local_filter(&self, results: Vec<MovieSummary>) -> Vec<MovieSummary> {
        let watched = if self.filters.hide_watched() {
            self.id_set(self.preferences.get_history().await)
        } else {
            HashSet::new()
        };
        let favorites = if self.filters.favorites_only() {
            self.id_set(self.preferences.get_favorites().await)
        } else {
            HashSet::new()
        };

        apply_local_user_filters(results, &self.filters, &watched, &favorites)
    }

    fn id_set(&self, ids: AppResult<Vec<MovieId>>) -> HashSet<MovieId> {
        ids.map(|ids| ids.into_iter().collect())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not read stored IDs, filtering without them");
                HashSet::new()
            })
    }
}

fn clamp_total_pages(reported: u32, current_page: u32) -> u32 {
    reported.clamp(1, MAX_REMOTE_PAGE).max(current_page)
}
