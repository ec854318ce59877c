//! Plain-text rendering of session snapshots.

use citycast_core::{
    ForecastSeries, SessionState, WeatherSnapshot,
    format::{
        capitalize_words, format_date, format_date_time, format_temperature, format_time,
        wind_direction,
    },
};

pub fn print_state(state: &SessionState) {
    if let Some(error) = &state.error {
        eprintln!("Error: {error}");
    }

    match &state.current_weather {
        Some(weather) => {
            print_current(weather);
            if let Some(forecast) = &state.forecast {
                print_forecast(forecast);
            }
            println!();
            println!("Weather data provided by OpenWeather");
        }
        None if state.error.is_none() => println!("No weather to show yet."),
        None => {}
    }
}

pub fn print_gps_warning() {
    eprintln!("Location services are turned off.");
    eprintln!("Enable them with `location.enabled = true` in your citycast config and try again.");
}

fn print_current(weather: &WeatherSnapshot) {
    let tz = weather.timezone;
    let description = weather
        .condition()
        .map(|c| capitalize_words(&c.description))
        .unwrap_or_default();

    if weather.country().is_empty() {
        println!("{}", weather.name);
    } else {
        println!("{}, {}", weather.name, weather.country());
    }
    println!("  {}  {}", format_temperature(weather.main.temp), description);
    println!("  Feels like {}", format_temperature(weather.main.feels_like));
    println!(
        "  Low {} / High {}",
        format_temperature(weather.main.temp_min),
        format_temperature(weather.main.temp_max)
    );
    println!("  Humidity {}%", weather.main.humidity);
    println!(
        "  Wind {:.1} m/s {}",
        weather.wind.speed,
        wind_direction(weather.wind.deg)
    );
    println!(
        "  Sunrise {}  Sunset {}",
        format_time(weather.sys.sunrise, tz),
        format_time(weather.sys.sunset, tz)
    );
    println!("  Updated {}", format_date_time(weather.dt, tz));
}

fn print_forecast(forecast: &ForecastSeries) {
    let tz = forecast.city.timezone;

    println!();
    println!("5-day forecast");
    for entry in forecast.daily() {
        let description = entry
            .condition()
            .map(|c| capitalize_words(&c.description))
            .unwrap_or_default();
        println!(
            "  {:<12} {:>6}  {:>3.0}%  {}",
            format_date(entry.dt, tz),
            format_temperature(entry.main.temp),
            entry.pop * 100.0,
            description
        );
    }
}
