//! OpenWeatherClient against a wiremock server.

use citycast_core::{
    Coordinates, Query, WeatherError, WeatherProvider, error::ApiKind,
    provider::openweather::OpenWeatherClient,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn current_json(name: &str, country: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
        "base": "stations",
        "main": {
            "temp": temp, "feels_like": temp - 0.4, "temp_min": temp - 1.0, "temp_max": temp + 1.0,
            "pressure": 1012, "humidity": 64, "sea_level": 1012, "grnd_level": 1008
        },
        "visibility": 10000,
        "wind": { "speed": 4.1, "deg": 250, "gust": 7.2 },
        "clouds": { "all": 75 },
        "dt": 1_700_000_000,
        "sys": { "country": country, "sunrise": 1_699_945_000, "sunset": 1_699_978_000 },
        "timezone": 0,
        "id": 2643743,
        "name": name,
        "cod": 200
    })
}

fn forecast_json(items: usize) -> serde_json::Value {
    let list: Vec<_> = (0..items)
        .map(|i| {
            serde_json::json!({
                "dt": 1_700_000_000 + 86_400 * i as i64,
                "main": {
                    "temp": 11.0, "feels_like": 10.2, "temp_min": 10.0, "temp_max": 12.0,
                    "pressure": 1010, "humidity": 80
                },
                "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10n" }],
                "clouds": { "all": 90 },
                "wind": { "speed": 5.0, "deg": 200 },
                "visibility": 10000,
                "pop": 0.65,
                "rain": { "3h": 0.8 },
                "sys": { "pod": "n" },
                "dt_txt": "2023-11-14 21:00:00"
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": items,
        "list": list,
        "city": {
            "id": 2643743,
            "name": "London",
            "coord": { "lat": 51.5085, "lon": -0.1257 },
            "country": "GB",
            "population": 1000000,
            "timezone": 0,
            "sunrise": 1_699_945_000,
            "sunset": 1_699_978_000
        }
    })
}

fn client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::builder("TEST_KEY".to_string())
        .base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn current_by_city_sends_key_and_metric_units() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("London", "GB", 22.5)))
        .expect(1)
        .mount(&server)
        .await;

    let weather = client(&server).current(&Query::City("London".into())).await.unwrap();

    assert_eq!(weather.name, "London");
    assert_eq!(weather.country(), "GB");
    assert_eq!(weather.main.temp, 22.5);
    assert_eq!(weather.wind.gust, Some(7.2));
    assert_eq!(weather.cod, 200);
}

#[tokio::test]
async fn current_by_coordinates_sends_lat_lon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json("London", "GB", 18.0)))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::Coordinates(Coordinates::new(51.5, -0.12));
    let weather = client(&server).current(&query).await.unwrap();
    assert_eq!(weather.main.temp, 18.0);
}

#[tokio::test]
async fn forecast_by_city_parses_series() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(3)))
        .mount(&server)
        .await;

    let series = client(&server).forecast(&Query::City("London".into())).await.unwrap();

    assert_eq!(series.list.len(), 3);
    assert_eq!(series.list[1].dt - series.list[0].dt, 86_400);
    assert_eq!(series.list[0].rain.as_ref().and_then(|r| r.three_hour), Some(0.8));
    assert_eq!(series.list[0].pop, 0.65);
    assert_eq!(series.city.name, "London");
    assert_eq!(series.city.population, 1_000_000);
}

#[tokio::test]
async fn forecast_by_coordinates_hits_forecast_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(40)))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::Coordinates(Coordinates::new(48.85, 2.35));
    let series = client(&server).forecast(&query).await.unwrap();
    assert_eq!(series.list.len(), 40);
    assert_eq!(series.daily().count(), 5);
}

#[tokio::test]
async fn not_found_carries_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).current(&Query::City("Atlantis".into())).await.unwrap_err();

    match &err {
        WeatherError::Api { kind, status, message } => {
            assert_eq!(*kind, ApiKind::Weather);
            assert_eq!(*status, 404);
            assert_eq!(message.as_deref(), Some("city not found"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(err.to_string(), "Failed to fetch weather data: city not found");
}

#[tokio::test]
async fn server_error_without_json_is_generic() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server).forecast(&Query::City("London".into())).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch forecast data");
}

#[tokio::test]
async fn empty_success_body_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client(&server).current(&Query::City("London".into())).await.unwrap_err();
    assert!(matches!(err, WeatherError::Api { status: 200, message: None, .. }));
    assert_eq!(err.to_string(), "Failed to fetch weather data");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\": 42}"))
        .mount(&server)
        .await;

    let err = client(&server).current(&Query::City("London".into())).await.unwrap_err();
    assert!(matches!(err, WeatherError::Decode { kind: ApiKind::Weather, .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = OpenWeatherClient::builder("TEST_KEY".to_string())
        .base_url(uri)
        .build()
        .unwrap();

    let err = client.current(&Query::City("London".into())).await.unwrap_err();
    assert!(matches!(err, WeatherError::Transport(_)));
    assert!(!err.to_string().is_empty());
}
