/// Streaming-provider lookups and the per-movie visibility rule
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    models::{MovieId, WatchProviders},
    services::catalog::CatalogClient,
};

/// Which providers a user cares about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderMode {
    /// Any provider counts
    #[default]
    All,
    /// Only the user's chosen favorite providers count
    Favorites,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderFilter {
    /// Hide movies with no offers in the active country
    pub require_in_country: bool,
    pub mode: ProviderMode,
    /// Favorite provider IDs, consulted in [`ProviderMode::Favorites`]
    pub favorite_providers: BTreeSet<u32>,
}

/// Whether a movie stays in the visible list.
///
/// Movies whose providers are still unresolved (`None`) are always shown.
/// An empty favorite set in favorites mode shows everything rather than hiding
/// the whole list.
pub fn is_visible(
    providers: Option<&WatchProviders>,
    filter: &ProviderFilter,
    country: &str,
) -> bool {
    let Some(providers) = providers else {
        return true;
    };

    let offers = providers.offers_in(country);

    if filter.require_in_country && offers.is_empty() {
        return false;
    }

    if filter.mode == ProviderMode::Favorites && !filter.favorite_providers.is_empty() {
        let candidates = if offers.is_empty() {
            providers.display_offers(country)
        } else {
            offers.to_vec()
        };
        return candidates
            .iter()
            .any(|p| filter.favorite_providers.contains(&p.provider_id));
    }

    true
}

/// Looks up providers for every ID with one request each, all in flight at once.
///
/// There is no batching or concurrency cap. A failed lookup is logged and
/// recorded as an empty provider set so the movie counts as resolved.
pub async fn fetch_providers(
    catalog: Arc<dyn CatalogClient>,
    ids: Vec<MovieId>,
) -> Vec<(MovieId, WatchProviders)> {
    let mut tasks = Vec::new();

    for id in ids {
        let catalog = Arc::clone(&catalog);
        let task = tokio::spawn(async move { (id, catalog.watch_providers(id).await) });
        tasks.push((id, task));
    }

    let mut resolved = Vec::with_capacity(tasks.len());
    let mut error_count = 0;

    for (id, task) in tasks {
        match task.await {
            Ok((id, Ok(providers))) => resolved.push((id, providers)),
            Ok((id, Err(e))) => {
                tracing::warn!(movie_id = id, error = %e, "Provider lookup failed");
                error_count += 1;
                resolved.push((id, WatchProviders::default()));
            }
            Err(e) => {
                tracing::error!(movie_id = id, error = %e, "Provider task join error");
                error_count += 1;
                resolved.push((id, WatchProviders::default()));
            }
        }
    }

    if error_count > 0 {
        tracing::warn!(
            success_count = resolved.len() - error_count,
            error_count,
            "Partial provider lookup failure"
        );
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::catalog::MockCatalogClient;
    use serde_json::json;

    fn providers(value: serde_json::Value) -> WatchProviders {
        serde_json::from_value(json!({ "results": value })).unwrap()
    }

    fn netflix_in_de() -> WatchProviders {
        providers(json!({
            "DE": { "flatrate": [{ "provider_id": 8, "provider_name": "Netflix" }] }
        }))
    }

    #[test]
    fn test_unresolved_is_visible() {
        let filter = ProviderFilter {
            require_in_country: true,
            mode: ProviderMode::Favorites,
            favorite_providers: BTreeSet::from([8]),
        };
        assert!(is_visible(None, &filter, "DE"));
    }

    #[test]
    fn test_require_in_country() {
        let filter = ProviderFilter {
            require_in_country: true,
            ..Default::default()
        };
        assert!(is_visible(Some(&netflix_in_de()), &filter, "DE"));
        assert!(!is_visible(Some(&netflix_in_de()), &filter, "US"));
        assert!(!is_visible(Some(&WatchProviders::default()), &filter, "DE"));

        let relaxed = ProviderFilter::default();
        assert!(is_visible(Some(&WatchProviders::default()), &relaxed, "DE"));
    }

    #[test]
    fn test_favorites_mode_matches_provider_ids() {
        let mut filter = ProviderFilter {
            mode: ProviderMode::Favorites,
            favorite_providers: BTreeSet::from([337]),
            ..Default::default()
        };
        assert!(!is_visible(Some(&netflix_in_de()), &filter, "DE"));

        filter.favorite_providers.insert(8);
        assert!(is_visible(Some(&netflix_in_de()), &filter, "DE"));
    }

    #[test]
    fn test_favorites_mode_with_empty_set_shows_everything() {
        let filter = ProviderFilter {
            mode: ProviderMode::Favorites,
            ..Default::default()
        };
        assert!(is_visible(Some(&WatchProviders::default()), &filter, "DE"));
    }

    #[tokio::test]
    async fn test_fetch_providers_records_failures_as_empty() {
        let mut mock = MockCatalogClient::new();
        mock.expect_watch_providers().returning(|id| {
            if id == 2 {
                Err(AppError::ExternalApi("boom".to_string()))
            } else {
                Ok(netflix_in_de())
            }
        });

        let resolved = fetch_providers(Arc::new(mock), vec![1, 2, 3]).await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].0, 1);
        assert_eq!(resolved[0].1.offers_in("DE").len(), 1);
        assert_eq!(resolved[1], (2, WatchProviders::default()));
    }
}
