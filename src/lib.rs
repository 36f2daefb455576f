//! Movie discovery client core: TMDB catalog access, discover-query
//! composition, paged result lists with local filters, favorites and watch
//! history, and location-based streaming-provider personalization.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
