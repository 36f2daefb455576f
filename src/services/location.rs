/// Approximate user location for provider personalization
///
/// Resolution runs once per session (plus explicit manual refreshes). A resolved
/// country is reused until it is older than the configured TTL. Denied permission
/// and any failure while positioning or geocoding leave the service with no
/// location, so provider lookups use the fallback country.
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::{
    db::KeyValueStore,
    error::{AppError, AppResult},
    models::{Coords, LocPermission, LocationState},
    services::geocoding::ReverseGeocoder,
};

/// Upper bound for one device position fix
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

const PERMISSION_KEY: &str = "loc.permission";
const COORDS_KEY: &str = "loc.coords";
const COUNTRY_KEY: &str = "loc.country";
const UPDATED_KEY: &str = "loc.updated";

/// Platform positioning bridge
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DevicePosition: Send + Sync {
    async fn check_permission(&self) -> AppResult<LocPermission>;

    /// Prompts the user where the platform supports it
    async fn request_permission(&self) -> AppResult<LocPermission>;

    async fn current_position(&self) -> AppResult<Coords>;
}

/// Position source for hosts without positioning hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

#[async_trait::async_trait]
impl DevicePosition for NoDevice {
    async fn check_permission(&self) -> AppResult<LocPermission> {
        Ok(LocPermission::Prompt)
    }

    async fn request_permission(&self) -> AppResult<LocPermission> {
        Ok(LocPermission::Denied)
    }

    async fn current_position(&self) -> AppResult<Coords> {
        Err(AppError::Location("No positioning device".to_string()))
    }
}

pub struct LocationService {
    store: Arc<dyn KeyValueStore>,
    device: Arc<dyn DevicePosition>,
    geocoder: Arc<dyn ReverseGeocoder>,
    ttl: Duration,
    fallback_country: String,
    state: watch::Sender<LocationState>,
}

impl LocationService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        device: Arc<dyn DevicePosition>,
        geocoder: Arc<dyn ReverseGeocoder>,
        ttl: Duration,
        fallback_country: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(LocationState::default());
        Self {
            store,
            device,
            geocoder,
            ttl,
            fallback_country: fallback_country.into().to_uppercase(),
            state,
        }
    }

    pub fn state(&self) -> LocationState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    /// Country for provider lookups: the resolved one, else the fallback
    pub fn country_code(&self) -> String {
        self.state
            .borrow()
            .country_code
            .clone()
            .unwrap_or_else(|| self.fallback_country.clone())
    }

    pub async fn cached_country_code(&self) -> Option<String> {
        self.store.get(COUNTRY_KEY).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read cached country");
            None
        })
    }

    /// Session start: settle permission, then refresh the location if stale.
    pub async fn init_on_app_start(&self) {
        self.refresh_permission().await;
        self.update_if_stale().await;
    }

    /// Checks permission, asks for it when not granted, and persists the answer.
    /// Anything but `granted` clears the cached location.
    pub async fn refresh_permission(&self) -> LocPermission {
        let mut permission = self.device.check_permission().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Permission check failed");
            LocPermission::Prompt
        });

        if permission != LocPermission::Granted {
            permission = self.device.request_permission().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Permission request failed");
                LocPermission::Denied
            });
        }

        if let Err(e) = self.store.set(PERMISSION_KEY, permission.as_str()).await {
            tracing::warn!(error = %e, "Could not persist location permission");
        }

        if permission == LocPermission::Granted {
            self.state.send_modify(|state| state.permission = permission);
        } else {
            tracing::info!(permission = %permission, "Location unavailable, clearing cached location");
            self.reset_persisted(permission).await;
        }

        permission
    }

    /// Manual refresh: always fetches a new fix when permitted.
    pub async fn update_now(&self) {
        if self.refresh_permission().await == LocPermission::Granted {
            self.fetch_and_persist().await;
        }
    }

    async fn update_if_stale(&self) {
        let last_updated = self.read_last_updated().await;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let now = Utc::now().timestamp_millis();

        let stale = match last_updated {
            Some(updated) => now.saturating_sub(updated) > ttl_ms,
            None => true,
        };

        if stale {
            if self.state.borrow().permission == LocPermission::Granted {
                self.fetch_and_persist().await;
            }
            return;
        }

        let coords = match self.store.get(COORDS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<Coords>(&raw).ok(),
            _ => None,
        };
        let country_code = self.cached_country_code().await;

        tracing::debug!(country = ?country_code, "Using cached location");

        self.state.send_modify(|state| {
            state.coords = coords;
            state.country_code = country_code;
            state.last_updated = last_updated;
        });
    }

    async fn read_last_updated(&self) -> Option<i64> {
        match self.store.get(UPDATED_KEY).await {
            Ok(Some(raw)) => raw.trim().parse().ok().filter(|ms: &i64| *ms > 0),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read location timestamp");
                None
            }
        }
    }

    async fn fetch_and_persist(&self) {
        if let Err(e) = self.try_fetch_and_persist().await {
            tracing::warn!(error = %e, "Location resolution failed, continuing without location");
            let permission = self.state.borrow().permission;
            self.reset_persisted(permission).await;
        }
    }

    async fn try_fetch_and_persist(&self) -> AppResult<()> {
        let mut coords = tokio::time::timeout(GEOLOCATION_TIMEOUT, self.device.current_position())
            .await
            .map_err(|_| AppError::Location("Timed out waiting for position".to_string()))??;

        let now = Utc::now().timestamp_millis();
        coords.timestamp = now;

        let country_code = self.geocoder.country_code(coords.lat, coords.lng).await?;

        self.store
            .set(COORDS_KEY, &serde_json::to_string(&coords)?)
            .await?;
        match &country_code {
            Some(code) => self.store.set(COUNTRY_KEY, code).await?,
            None => self.store.remove(COUNTRY_KEY).await?,
        }
        self.store.set(UPDATED_KEY, &now.to_string()).await?;

        tracing::info!(country = ?country_code, "Location updated");

        self.state.send_replace(LocationState {
            permission: LocPermission::Granted,
            coords: Some(coords),
            country_code,
            last_updated: Some(now),
        });

        Ok(())
    }

    async fn reset_persisted(&self, permission: LocPermission) {
        for key in [COORDS_KEY, COUNTRY_KEY, UPDATED_KEY] {
            if let Err(e) = self.store.remove(key).await {
                tracing::warn!(key = %key, error = %e, "Could not clear cached location");
            }
        }
        self.state.send_replace(LocationState::cleared(permission));
    }
}
