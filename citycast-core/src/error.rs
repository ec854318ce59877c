use std::fmt;

/// Which endpoint a failed API call was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Weather,
    Forecast,
}

impl ApiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::Weather => "weather",
            ApiKind::Forecast => "forecast",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the weather client. Every path out of the client is one of these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WeatherError {
    /// Timeout, DNS, connection reset and friends. Carries the transport message as-is.
    #[error("{0}")]
    Transport(String),

    /// Non-success status, or a success status with an empty body.
    #[error("{}", api_message(*kind, message.as_deref()))]
    Api {
        kind: ApiKind,
        status: u16,
        message: Option<String>,
    },

    #[error("Failed to parse {kind} response: {detail}")]
    Decode { kind: ApiKind, detail: String },
}

fn api_message(kind: ApiKind, message: Option<&str>) -> String {
    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => format!("Failed to fetch {kind} data: {m}"),
        None => format!("Failed to fetch {kind} data"),
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Transport(e.to_string())
    }
}

/// Location service and geocoder errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location request timed out")]
    Timeout,
    #[error("Geocoder error: {0}")]
    Geocoder(String),
    #[error("Location source error: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_server_message() {
        let err = WeatherError::Api {
            kind: ApiKind::Weather,
            status: 404,
            message: Some("city not found".into()),
        };
        assert_eq!(err.to_string(), "Failed to fetch weather data: city not found");
    }

    #[test]
    fn api_error_without_message_is_generic() {
        let err = WeatherError::Api { kind: ApiKind::Forecast, status: 200, message: None };
        assert_eq!(err.to_string(), "Failed to fetch forecast data");

        let blank = WeatherError::Api {
            kind: ApiKind::Weather,
            status: 500,
            message: Some("   ".into()),
        };
        assert_eq!(blank.to_string(), "Failed to fetch weather data");
    }

    #[test]
    fn transport_error_is_passed_through() {
        let err = WeatherError::Transport("operation timed out".into());
        assert_eq!(err.to_string(), "operation timed out");
    }
}
