//! Reverse geocoding: coordinates to a place name and a display address.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::LocationError, model::Coordinates};

pub const UNKNOWN_LOCATION: &str = "Unknown location";
pub const UNABLE_TO_GET_ADDRESS: &str = "Unable to get address";
pub const UNKNOWN_CITY: &str = "Unknown";

/// Best-effort address breakdown for a point, as a device geocoder reports it.
/// Any component may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    /// House number.
    pub sub_thoroughfare: Option<String>,
    /// Street.
    pub thoroughfare: Option<String>,
    pub sub_locality: Option<String>,
    pub locality: Option<String>,
    pub sub_admin_area: Option<String>,
    pub admin_area: Option<String>,
    pub country_name: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Address {
    /// Locality, then sub-locality, then admin area, then country.
    pub fn city_name(&self) -> Option<&str> {
        present(&self.locality)
            .or_else(|| present(&self.sub_locality))
            .or_else(|| present(&self.admin_area))
            .or_else(|| present(&self.country_name))
    }

    /// Comma-joined non-empty components, street first and country last.
    pub fn display(&self) -> String {
        let parts: Vec<&str> = [
            &self.sub_thoroughfare,
            &self.thoroughfare,
            &self.locality,
            &self.sub_admin_area,
            &self.admin_area,
            &self.country_name,
        ]
        .into_iter()
        .filter_map(present)
        .collect();

        if parts.is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Coordinates to address candidates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn from_location(
        &self,
        coords: Coordinates,
        max_results: usize,
    ) -> Result<Vec<Address>, LocationError>;
}

/// Outcome of a reverse lookup: `city` is `None` when nothing usable came back.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub city: Option<String>,
    pub address: String,
}

impl Placemark {
    pub fn from_address(address: &Address) -> Self {
        Self {
            city: address.city_name().map(str::to_string),
            address: address.display(),
        }
    }

    pub fn unknown() -> Self {
        Self { city: None, address: UNKNOWN_LOCATION.to_string() }
    }

    pub fn unavailable() -> Self {
        Self { city: None, address: UNABLE_TO_GET_ADDRESS.to_string() }
    }
}

/// Guess a city from a display address when no geocoded city is at hand.
///
/// Takes the first component that doesn't start with a digit (skipping house
/// numbers), else the first non-blank component, else `"Unknown"`.
pub fn city_from_address(address: &str) -> String {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();

    parts
        .iter()
        .find(|p| !p.is_empty() && !p.starts_with(|c: char| c.is_ascii_digit()))
        .or_else(|| parts.iter().find(|p| !p.is_empty()))
        .map(|p| p.to_string())
        .unwrap_or_else(|| UNKNOWN_CITY.to_string())
}
