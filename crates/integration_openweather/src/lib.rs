//! OpenWeatherMap integration
//!
//! Client for the OpenWeatherMap current-weather API
//! (<https://openweathermap.org/current>) and a two-tier cache for its
//! condition icons.
//!
//! - [`OpenWeatherClient`] fetches current weather; errors are returned to the caller.
//! - [`IconCache`] resolves icon identifiers from the local cache directory or the
//!   network and always yields an image.

pub mod client;
pub mod config;
pub mod error;
pub mod icon_cache;
mod models;
pub mod transport;

pub use client::{OpenWeatherClient, WeatherClient};
pub use config::OpenWeatherConfig;
pub use error::WeatherError;
pub use icon_cache::{Icon, IconCache, IconSource, IconStore, PersistEvent, validate_icon_id};
pub use models::{MISSING_NAME_SENTINEL, Weather, WeatherInfo};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
