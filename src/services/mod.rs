pub mod catalog;
pub mod geocoding;
pub mod library;
pub mod location;
pub mod preferences;
pub mod query_composer;
pub mod results;
pub mod vibe;
pub mod watch_providers;

pub use catalog::{CatalogClient, DiscoverParams, TmdbClient, TrendingWindow};
pub use geocoding::{NominatimGeocoder, ReverseGeocoder};
pub use location::{DevicePosition, LocationService, NoDevice};
pub use preferences::PreferenceStore;
pub use query_composer::compose_discover_params;
pub use results::{ListPhase, ListQuery, ResultListController, ScrollSignal};
pub use watch_providers::{ProviderFilter, ProviderMode};
