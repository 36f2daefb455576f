use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    db::KeyValueStore,
    error::AppResult,
    models::{MovieId, Settings, SettingsPatch},
};

/// Maximum number of watch-history entries kept
pub const HISTORY_MAX: usize = 200;

const SETTINGS_KEY: &str = "settings";
const FAVORITES_KEY: &str = "favorites";
const HISTORY_KEY: &str = "history";

/// Settings, favorites and watch history on top of a string key/value store
///
/// Every mutation is a read-modify-write without a lock, so two callers toggling
/// the same list concurrently can lose one of the updates.
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads and parses a record; missing or corrupt text yields `None`.
    async fn read<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let Some(text) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupt preference record");
                Ok(None)
            }
        }
    }

    async fn write<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json).await
    }

    pub async fn get_settings(&self) -> AppResult<Settings> {
        Ok(self.read(SETTINGS_KEY).await?.unwrap_or_default())
    }

    pub async fn set_settings(&self, settings: &Settings) -> AppResult<()> {
        self.write(SETTINGS_KEY, settings).await
    }

    /// Merges the patch over the stored settings and persists the result.
    pub async fn patch_settings(&self, patch: SettingsPatch) -> AppResult<Settings> {
        let next = self.get_settings().await?.merge(patch);
        self.set_settings(&next).await?;
        Ok(next)
    }

    /// Favorite IDs, most recently added first
    pub async fn get_favorites(&self) -> AppResult<Vec<MovieId>> {
        Ok(self.read(FAVORITES_KEY).await?.unwrap_or_default())
    }

    /// Stores the list with repeated IDs dropped, keeping each first occurrence.
    pub async fn set_favorites(&self, ids: &[MovieId]) -> AppResult<()> {
        let mut seen = HashSet::new();
        let unique: Vec<MovieId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        self.write(FAVORITES_KEY, &unique).await
    }

    /// Adds the ID at the front, or removes it when already present.
    /// Returns whether the movie is a favorite afterwards.
    pub async fn toggle_favorite(&self, id: MovieId) -> AppResult<bool> {
        let mut favorites = self.get_favorites().await?;

        let now_favorite = if favorites.contains(&id) {
            favorites.retain(|x| *x != id);
            false
        } else {
            favorites.insert(0, id);
            true
        };

        self.set_favorites(&favorites).await?;
        tracing::debug!(movie_id = id, favorite = now_favorite, "Favorite toggled");
        Ok(now_favorite)
    }

    pub async fn is_favorite(&self, id: MovieId) -> AppResult<bool> {
        Ok(self.get_favorites().await?.contains(&id))
    }

    pub async fn clear_favorites(&self) -> AppResult<()> {
        self.set_favorites(&[]).await
    }

    /// Watched IDs, most recently watched first
    pub async fn get_history(&self) -> AppResult<Vec<MovieId>> {
        Ok(self.read(HISTORY_KEY).await?.unwrap_or_default())
    }

    /// Moves (or inserts) the ID to the front and drops entries past the cap.
    pub async fn add_to_history(&self, id: MovieId) -> AppResult<()> {
        let mut history = self.get_history().await?;
        history.retain(|x| *x != id);
        history.insert(0, id);
        history.truncate(HISTORY_MAX);
        self.write(HISTORY_KEY, &history).await
    }

    pub async fn remove_from_history(&self, id: MovieId) -> AppResult<()> {
        let mut history = self.get_history().await?;
        history.retain(|x| *x != id);
        self.write(HISTORY_KEY, &history).await
    }

    pub async fn clear_history(&self) -> AppResult<()> {
        self.write::<[MovieId]>(HISTORY_KEY, &[]).await
    }

    /// Removes settings, favorites and history.
    pub async fn clear_all(&self) -> AppResult<()> {
        for key in [SETTINGS_KEY, FAVORITES_KEY, HISTORY_KEY] {
            self.store.remove(key).await?;
        }
        tracing::info!("All preferences cleared");
        Ok(())
    }
}
