use std::sync::Arc;

use crate::{
    models::{MovieCard, MovieId},
    services::catalog::CatalogClient,
};

/// Batch size the favorites and history screens load details with
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Loads cards for stored IDs, `batch_size` detail requests at a time.
///
/// Requests within a batch run concurrently; batches run one after another.
/// Movies whose details cannot be fetched are left out. Output keeps the order
/// of `ids`.
pub async fn load_movie_cards(
    catalog: Arc<dyn CatalogClient>,
    ids: &[MovieId],
    batch_size: usize,
) -> Vec<MovieCard> {
    let mut cards = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(batch_size.max(1)) {
        let mut tasks = Vec::with_capacity(chunk.len());

        for &id in chunk {
            let catalog = Arc::clone(&catalog);
            tasks.push((
                id,
                tokio::spawn(async move { catalog.movie_details(id).await }),
            ));
        }

        for (id, task) in tasks {
            match task.await {
                Ok(Ok(details)) => cards.push(MovieCard::from(details)),
                Ok(Err(e)) => {
                    tracing::warn!(movie_id = id, error = %e, "Skipping movie without details");
                }
                Err(e) => {
                    tracing::error!(movie_id = id, error = %e, "Detail task join error");
                }
            }
        }
    }

    tracing::info!(requested = ids.len(), loaded = cards.len(), "Movie cards loaded");

    cards
}
