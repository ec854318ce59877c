//! Core library for the `citycast` weather client.
//!
//! This crate defines:
//! - Configuration and the persisted last-searched city
//! - The OpenWeather client (current conditions and 5-day forecast)
//! - Device location: one-shot fixes, reverse geocoding
//! - The session orchestrator and the state it publishes
//!
//! It is used by `citycast-cli`, but any front end can drive a `WeatherSession`.

pub mod config;
pub mod device;
pub mod error;
pub mod format;
pub mod location;
pub mod model;
pub mod prefs;
pub mod provider;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::{LocationError, WeatherError};
pub use location::{DeviceSettings, LocationProvider, LocationSource};
pub use model::{Coordinates, ForecastSeries, LocationInfo, Query, WeatherSnapshot};
pub use prefs::Preferences;
pub use provider::WeatherProvider;
pub use session::WeatherSession;
pub use state::SessionState;
