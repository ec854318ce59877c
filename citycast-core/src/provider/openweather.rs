use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::DEFAULT_BASE_URL,
    error::{ApiKind, WeatherError},
    model::{ForecastSeries, Query, WeatherSnapshot},
};

use super::WeatherProvider;

const UNITS: &str = "metric";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeather 2.5 client covering the four query shapes:
/// current or forecast, keyed by coordinates or by city name.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherClient, WeatherError> {
        let http = Client::builder().timeout(self.timeout).build()?;

        Ok(OpenWeatherClient {
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

impl OpenWeatherClient {
    pub fn builder(api_key: String) -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new(api_key: String) -> Result<Self, WeatherError> {
        Self::builder(api_key).build()
    }

    fn query_params(&self, query: &Query) -> Vec<(&'static str, String)> {
        let mut params = match query {
            Query::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            Query::City(name) => vec![("q", name.clone())],
        };
        params.push(("appid", self.api_key.clone()));
        params.push(("units", UNITS.to_string()));
        params
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        kind: ApiKind,
        query: &Query,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("GET {} for {}", url, query);

        let res = self
            .http
            .get(&url)
            .query(&self.query_params(query))
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() || body.trim().is_empty() {
            tracing::debug!(
                "OpenWeather {} request failed with status {}: {}",
                kind,
                status,
                truncate_body(&body)
            );
            return Err(WeatherError::Api {
                kind,
                status: status.as_u16(),
                message: server_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Decode {
            kind,
            detail: e.to_string(),
        })
    }
}

/// Error payload shape: `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, query: &Query) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch("weather", ApiKind::Weather, query).await
    }

    async fn forecast(&self, query: &Query) -> Result<ForecastSeries, WeatherError> {
        self.fetch("forecast", ApiKind::Forecast, query).await
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;

    #[test]
    fn query_params_for_city() {
        let client = OpenWeatherClient::new("KEY".into()).unwrap();
        let params = client.query_params(&Query::City("London".into()));

        assert_eq!(
            params,
            vec![
                ("q", "London".to_string()),
                ("appid", "KEY".to_string()),
                ("units", "metric".to_string()),
            ]
        );
    }

    #[test]
    fn query_params_for_coordinates() {
        let client = OpenWeatherClient::new("KEY".into()).unwrap();
        let params = client.query_params(&Query::Coordinates(Coordinates::new(51.5, -0.12)));

        assert_eq!(params[0], ("lat", "51.5".to_string()));
        assert_eq!(params[1], ("lon", "-0.12".to_string()));
        assert!(params.contains(&("units", "metric".to_string())));
    }

    #[test]
    fn server_message_reads_error_payload() {
        assert_eq!(
            server_message(r#"{"cod":"404","message":"city not found"}"#).as_deref(),
            Some("city not found")
        );
        assert_eq!(server_message("<html>bad gateway</html>"), None);
        assert_eq!(server_message(r#"{"cod":"500","message":""}"#), None);
    }

    #[test]
    fn builder_strips_trailing_slash() {
        let client = OpenWeatherClient::builder("KEY".into())
            .base_url("http://localhost:1234/data/2.5/")
            .build()
            .unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/data/2.5");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(truncate_body(&long).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
