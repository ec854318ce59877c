use crate::{
    Config,
    error::WeatherError,
    model::{ForecastSeries, Query, WeatherSnapshot},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of current conditions and forecasts. Implementations never panic or
/// throw past this boundary; every failure comes back as a `WeatherError`.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, query: &Query) -> Result<WeatherSnapshot, WeatherError>;

    /// 5-day forecast in 3-hour steps.
    async fn forecast(&self, query: &Query) -> Result<ForecastSeries, WeatherError>;
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let client = OpenWeatherClient::builder(api_key.to_owned())
        .base_url(config.base_url.clone())
        .timeout(config.request_timeout())
        .build()?;

    Ok(Arc::new(client))
}
