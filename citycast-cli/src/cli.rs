use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password};

use citycast_core::{
    Config, Coordinates, LocationProvider, Preferences, Query, WeatherSession,
    config::PermissionSetting,
    device::ConfiguredDevice,
    location::{ip::IpLocationSource, nominatim::NominatimGeocoder},
    prefs::{FileStore, KeyValueStore, MemoryStore},
    provider::provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "Current weather and 5-day forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store your OpenWeather API key.
    Configure,

    /// Show weather for a city, or for coordinates.
    Show {
        /// City name; defaults to the last one searched.
        city: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true, conflicts_with = "city")]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Show weather for where you are now.
    Here,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon } => {
                let config = Config::load()?;
                let (session, _) = build_session(&config)?;

                let query = match (lat, lon) {
                    (Some(lat), Some(lon)) => Query::Coordinates(Coordinates::new(lat, lon)),
                    _ => Query::City(city.unwrap_or_else(|| session.last_searched_city())),
                };
                show(&session, query).await
            }
            Command::Here => {
                let config = Config::load()?;
                let (session, device) = build_session(&config)?;
                here(&session, &device).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key);
    config.require_api_key()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_session(config: &Config) -> anyhow::Result<(WeatherSession, Arc<ConfiguredDevice>)> {
    let provider = provider_from_config(config)?;

    let location = LocationProvider::new(
        Arc::new(IpLocationSource::new()?),
        Arc::new(NominatimGeocoder::new()?),
    )
    .with_fix_timeout(config.fix_timeout());

    let store: Arc<dyn KeyValueStore> = match FileStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("Preferences unavailable, last city won't be remembered: {:#}", e);
            Arc::new(MemoryStore::new())
        }
    };
    let prefs = Preferences::with_default_city(store, config.default_city.clone());

    let device = Arc::new(ConfiguredDevice::from_config(&config.location));
    let session = WeatherSession::new(provider, location, device.clone(), prefs);

    Ok((session, device))
}

async fn search(session: &WeatherSession, query: &Query) {
    match query {
        Query::City(name) => session.search_by_city(name).await,
        Query::Coordinates(coords) => session.search_by_coordinates(*coords).await,
    }
}

async fn show(session: &WeatherSession, query: Query) -> anyhow::Result<()> {
    search(session, &query).await;

    loop {
        session.settle().await;
        let state = session.state();
        render::print_state(&state);

        if state.error.is_none() {
            return Ok(());
        }

        let retry = Confirm::new("Retry?").with_default(false).prompt().unwrap_or(false);
        if !retry {
            return Ok(());
        }

        session.clear_error();
        if state.current_weather.is_some() {
            session.refresh().await;
        } else {
            search(session, &query).await;
        }
    }
}

async fn here(session: &WeatherSession, device: &ConfiguredDevice) -> anyhow::Result<()> {
    println!("Locating...");
    session.use_current_location().await;

    loop {
        let state = session.state();

        if state.show_permission_request {
            let granted = Confirm::new("Allow citycast to use your location?")
                .with_default(true)
                .with_help_message("Your approximate location is derived from your IP address")
                .prompt()
                .unwrap_or(false);

            device.set_permission(granted);
            if let Err(e) = remember_permission(granted) {
                tracing::warn!("Failed to save location permission: {:#}", e);
            }
            session.on_permission_resolved(granted).await;
            continue;
        }

        if state.show_gps_warning_dialog {
            render::print_gps_warning();
            session.dismiss_gps_warning();
            return Ok(());
        }

        if let Some(info) = state.location_info.filter(|_| state.show_location_dialog) {
            println!("You appear to be at: {}", info.address);
            let accepted = Confirm::new("Get weather for this location?")
                .with_default(true)
                .prompt()
                .unwrap_or(false);

            if accepted {
                session.confirm_location_and_fetch().await;
                session.settle().await;
            } else {
                session.dismiss_location_dialog();
                return Ok(());
            }
        }

        break;
    }

    render::print_state(&session.state());
    Ok(())
}

/// Persist the answer to the file only, so an API key taken from the
/// environment is never written out.
fn remember_permission(granted: bool) -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;
    config.location.permission = if granted {
        PermissionSetting::Granted
    } else {
        PermissionSetting::Denied
    };
    config.save_to(&path)
}
