use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What a lookup is keyed on. Each shape maps onto one query form of the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Coordinates(Coordinates),
    City(String),
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::Coordinates(c) => write!(f, "({c})"),
            Query::City(name) => f.write_str(name),
        }
    }
}

/// A resolved fix plus its human-readable address, held while the user confirms it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl LocationInfo {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: u32,
    pub humidity: u8,
    #[serde(default)]
    pub sea_level: Option<u32>,
    #[serde(default, rename = "grnd_level")]
    pub ground_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: u16,
    #[serde(default)]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// Current conditions for one place, as returned by `/weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub coord: Coordinates,
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    #[serde(default)]
    pub visibility: Option<u32>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    pub dt: i64,
    #[serde(default)]
    pub sys: Sys,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub cod: i32,
}

impl WeatherSnapshot {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn country(&self) -> &str {
        &self.sys.country
    }

    /// Whether two snapshots describe the same place.
    pub fn same_place(&self, other: &WeatherSnapshot) -> bool {
        if self.id != 0 && other.id != 0 {
            return self.id == other.id;
        }
        self.name.eq_ignore_ascii_case(&other.name) && self.sys.country == other.sys.country
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(default, rename = "3h")]
    pub three_hour: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastSys {
    #[serde(default)]
    pub pod: String,
}

/// One 3-hour step of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub visibility: Option<u32>,
    /// Probability of precipitation, 0.0..=1.0.
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub rain: Option<Precipitation>,
    #[serde(default)]
    pub snow: Option<Precipitation>,
    #[serde(default)]
    pub sys: ForecastSys,
    #[serde(default)]
    pub dt_txt: String,
}

impl ForecastEntry {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub coord: Coordinates,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// The 5-day / 3-hour forecast as returned by `/forecast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    #[serde(default)]
    pub cod: String,
    #[serde(default)]
    pub message: i64,
    #[serde(default)]
    pub cnt: u32,
    pub list: Vec<ForecastEntry>,
    pub city: City,
}

/// Steps per day in a 3-hour series.
const STEPS_PER_DAY: usize = 8;
const MAX_DAYS: usize = 5;

impl ForecastSeries {
    /// One entry per day: every 8th step, at most five days.
    pub fn daily(&self) -> impl Iterator<Item = &ForecastEntry> {
        self.list.iter().step_by(STEPS_PER_DAY).take(MAX_DAYS)
    }
}
