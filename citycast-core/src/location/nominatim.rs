//! Reverse geocoding through Nominatim (OpenStreetMap). Free, no API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::geocode::{Address, Geocoder};
use crate::{error::LocationError, model::Coordinates};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("citycast/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl From<NominatimAddress> for Address {
    fn from(a: NominatimAddress) -> Self {
        Address {
            sub_thoroughfare: a.house_number,
            thoroughfare: a.road,
            sub_locality: a.suburb.or(a.neighbourhood),
            locality: a.city.or(a.town).or(a.village).or(a.municipality),
            sub_admin_area: a.county.or(a.state_district),
            admin_area: a.state,
            country_name: a.country,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, LocationError> {
        Self::with_endpoint(NOMINATIM_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LocationError::Geocoder(e.to_string()))?;

        Ok(Self { http, endpoint: endpoint.into() })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    /// Nominatim's reverse endpoint yields a single best match, so at most one
    /// address comes back regardless of `max_results`.
    async fn from_location(
        &self,
        coords: Coordinates,
        max_results: usize,
    ) -> Result<Vec<Address>, LocationError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| LocationError::Geocoder(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::Geocoder(format!(
                "reverse geocode returned status {}",
                response.status()
            )));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Geocoder(e.to_string()))?;

        Ok(body.address.map(Address::from).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_town_when_no_city() {
        let raw: NominatimResponse = serde_json::from_value(serde_json::json!({
            "address": {
                "road": "High Street",
                "town": "Hebden Bridge",
                "county": "West Yorkshire",
                "state": "England",
                "country": "United Kingdom"
            }
        }))
        .unwrap();

        let address = Address::from(raw.address.unwrap());
        assert_eq!(address.city_name(), Some("Hebden Bridge"));
        assert_eq!(
            address.display(),
            "High Street, Hebden Bridge, West Yorkshire, England, United Kingdom"
        );
    }

    #[tokio::test]
    async fn zero_results_requested_skips_network() {
        let geocoder = NominatimGeocoder::with_endpoint("http://127.0.0.1:9/unreachable").unwrap();
        let found = geocoder.from_location(Coordinates::new(0.0, 0.0), 0).await.unwrap();
        assert!(found.is_empty());
    }
}
