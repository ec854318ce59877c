//! Human-friendly rendering of API values.

use chrono::{DateTime, FixedOffset, Utc};

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// Rounds half up: `22.5` renders as `"23°C"`, `-2.5` as `"-2°C"`.
pub fn format_temperature(temp: f64) -> String {
    format!("{}°C", (temp + 0.5).floor() as i64)
}

fn local_time(timestamp: i64, utc_offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(utc_offset_secs)?;
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&offset))
}

fn format_with(timestamp: i64, utc_offset_secs: i32, pattern: &str) -> String {
    local_time(timestamp, utc_offset_secs)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| "--".to_string())
}

/// `HH:MM` in the place's own offset.
pub fn format_time(timestamp: i64, utc_offset_secs: i32) -> String {
    format_with(timestamp, utc_offset_secs, "%H:%M")
}

/// e.g. `"Tue, Nov 14"`.
pub fn format_date(timestamp: i64, utc_offset_secs: i32) -> String {
    format_with(timestamp, utc_offset_secs, "%a, %b %d")
}

/// e.g. `"Nov 14, 22:13"`.
pub fn format_date_time(timestamp: i64, utc_offset_secs: i32) -> String {
    format_with(timestamp, utc_offset_secs, "%b %d, %H:%M")
}

/// Uppercase the first letter of every space-separated word.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 8-point compass name for a bearing in degrees.
pub fn wind_direction(degrees: u16) -> &'static str {
    match degrees {
        0..=22 | 338..=360 => "N",
        23..=67 => "NE",
        68..=112 => "E",
        113..=157 => "SE",
        158..=202 => "S",
        203..=247 => "SW",
        248..=292 => "W",
        293..=337 => "NW",
        _ => "N",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_is_rounded() {
        assert_eq!(format_temperature(22.5), "23°C");
        assert_eq!(format_temperature(-0.4), "0°C");
        assert_eq!(format_temperature(-3.6), "-4°C");
        assert_eq!(format_temperature(-0.5), "0°C");
        assert_eq!(format_temperature(-2.5), "-2°C");
    }

    #[test]
    fn times_use_the_place_offset() {
        // 2023-11-14 22:13:20 UTC
        let ts = 1_700_000_000;
        assert_eq!(format_time(ts, 0), "22:13");
        assert_eq!(format_time(ts, 3_600), "23:13");
        assert_eq!(format_date(ts, 0), "Tue, Nov 14");
        assert_eq!(format_date(ts, 7_200), "Wed, Nov 15");
        assert_eq!(format_date_time(ts, 0), "Nov 14, 22:13");
    }

    #[test]
    fn invalid_offset_renders_placeholder() {
        assert_eq!(format_time(0, 200_000), "--");
    }

    #[test]
    fn capitalizes_each_word() {
        assert_eq!(capitalize_words("light intensity drizzle"), "Light Intensity Drizzle");
        assert_eq!(capitalize_words("Clear  sky"), "Clear  Sky");
    }

    #[test]
    fn compass_points() {
        assert_eq!(wind_direction(0), "N");
        assert_eq!(wind_direction(45), "NE");
        assert_eq!(wind_direction(240), "SW");
        assert_eq!(wind_direction(350), "N");
        assert_eq!(wind_direction(400), "N");
    }

    #[test]
    fn icon_url_points_at_openweather() {
        assert_eq!(icon_url("01d"), "https://openweathermap.org/img/wn/01d@2x.png");
    }
}
