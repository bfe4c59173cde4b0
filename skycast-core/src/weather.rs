//! Weather aggregation engine.
//!
//! Merges current conditions, the short-term forecast and the air-quality
//! index into one canonical [`WeatherSnapshot`], computing the derived
//! fields (temperature bounds, sun times, day-part narrative) along the way.

use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use tracing::warn;

use crate::{
    config::Config,
    error::{ConfigError, FetchError},
    model::{DayPart, WeatherSnapshot},
};

use openweather::{DEFAULT_BASE_URL, OpenWeatherGateway, OwCurrent, OwForecastEntry, OwMain};

mod openweather;

/// Forecast samples considered "near term": ~24h at 3h intervals.
const NEAR_TERM_SAMPLES: usize = 8;

/// Minimum window size before the day-part narrative is emitted.
const DAY_PART_MIN_SAMPLES: usize = 5;

/// Neutral air-quality index used when the lookup fails.
const DEFAULT_AQI: i32 = 1;

/// Aggregates the outbound weather calls into canonical snapshots.
///
/// Stateless across requests; safe to clone and share.
#[derive(Debug, Clone)]
pub struct WeatherService {
    gateway: OpenWeatherGateway,
}

impl WeatherService {
    /// Fails when no weather API key is configured. The check happens here,
    /// at construction, not on the first fetch.
    pub fn new(http: Client, config: &Config) -> Result<Self, ConfigError> {
        let api_key = config
            .weather_api_key()
            .ok_or(ConfigError::MissingApiKey("weather"))?;

        Ok(Self::with_base_url(http, api_key, DEFAULT_BASE_URL))
    }

    /// Point the gateway at an alternate host. Tests use this to talk to a
    /// mock server.
    pub fn with_base_url(
        http: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            gateway: OpenWeatherGateway::new(http, api_key.into(), base_url.into()),
        }
    }

    /// Fetch and merge the weather for `city`.
    ///
    /// Current conditions and forecast are requested concurrently and both
    /// must succeed; the first failure aborts the join and drops the other
    /// in-flight call. The air-quality lookup needs the coordinates from the
    /// current response, runs after it, and is tolerated: on failure the
    /// snapshot carries the neutral index instead.
    pub async fn fetch(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::CityNotFound(city.to_string()));
        }

        let (current, forecast) =
            tokio::try_join!(self.gateway.current(city), self.gateway.forecast(city))?;

        let aqi = match self.gateway.air_quality(current.coord.lat, current.coord.lon).await {
            Ok(aqi) => aqi,
            Err(err) => {
                warn!(city, error = %err, "air quality lookup failed, using neutral index");
                DEFAULT_AQI
            }
        };

        build_snapshot(current, forecast.list, aqi)
    }
}

fn build_snapshot(
    current: OwCurrent,
    forecast: Vec<OwForecastEntry>,
    aqi: i32,
) -> Result<WeatherSnapshot, FetchError> {
    let window: Vec<OwForecastEntry> =
        forecast.into_iter().take(NEAR_TERM_SAMPLES).collect();

    let (max_temp, min_temp) = temperature_bounds(&window, &current.main);
    let (sunrise, sunset, day_length) =
        sun_times(current.sys.sunrise, current.sys.sunset, current.timezone)?;

    Ok(WeatherSnapshot {
        city: current.name,
        country: current.sys.country,
        current_temp: current.main.temp,
        condition: condition_label(&current.weather),
        description: current
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "Clear".to_string()),
        humidity: current.main.humidity,
        wind_speed: current.wind.speed,
        aqi,
        max_temp,
        min_temp,
        visibility_km: current.visibility / 1000.0,
        sunrise,
        sunset,
        day_length,
        day_parts: day_parts(&window),
    })
}

fn condition_label(weather: &[openweather::OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.main.clone())
        .unwrap_or_else(|| "Clear".to_string())
}

/// Max/min over the window's per-sample bounds; an empty window falls back
/// to the current reading's own bounds.
fn temperature_bounds(window: &[OwForecastEntry], current: &OwMain) -> (f64, f64) {
    if window.is_empty() {
        return (current.temp_max, current.temp_min);
    }

    let max = window.iter().map(|e| e.main.temp_max).fold(f64::MIN, f64::max);
    let min = window.iter().map(|e| e.main.temp_min).fold(f64::MAX, f64::min);
    (max, min)
}

/// Localized sunrise/sunset clock strings plus the day length between them.
fn sun_times(
    sunrise: i64,
    sunset: i64,
    utc_offset_secs: i32,
) -> Result<(String, String, String), FetchError> {
    let offset = FixedOffset::east_opt(utc_offset_secs).ok_or_else(|| {
        FetchError::Malformed(format!("UTC offset out of range: {utc_offset_secs}"))
    })?;

    let rise = local_time(sunrise, offset)?;
    let set = local_time(sunset, offset)?;

    let diff = set - rise;
    let hours = diff.num_hours();
    let minutes = diff.num_minutes() - hours * 60;

    Ok((
        format_clock(&rise),
        format_clock(&set),
        format!("{hours}h {minutes}m"),
    ))
}

fn local_time(epoch_secs: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>, FetchError> {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.with_timezone(&offset))
        .ok_or_else(|| FetchError::Malformed(format!("sun time out of range: {epoch_secs}")))
}

/// 12-hour clock without a leading zero, e.g. "6:30 AM".
fn format_clock(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%-I:%M %p").to_string()
}

/// Morning/Afternoon/Evening narrative from window indices 0/2/4.
///
/// The indices assume 3-hourly samples, so the three picks land roughly six
/// hours apart. Windows shorter than [`DAY_PART_MIN_SAMPLES`] produce no
/// narrative at all, never a partial one.
fn day_parts(window: &[OwForecastEntry]) -> Vec<DayPart> {
    if window.len() < DAY_PART_MIN_SAMPLES {
        return Vec::new();
    }

    [("Morning", 0), ("Afternoon", 2), ("Evening", 4)]
        .into_iter()
        .map(|(name, idx)| {
            let entry = &window[idx];
            DayPart {
                name: name.to_string(),
                temp: entry.main.temp,
                condition: condition_label(&entry.weather),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::openweather::{OwCoord, OwCurrent, OwForecastEntry, OwMain, OwSys, OwWeather, OwWind};
    use super::*;

    fn entry(temp: f64, temp_min: f64, temp_max: f64, condition: &str) -> OwForecastEntry {
        OwForecastEntry {
            main: OwMain { temp, humidity: 50, temp_min, temp_max },
            weather: vec![OwWeather {
                main: condition.to_string(),
                description: condition.to_lowercase(),
            }],
        }
    }

    fn sample_current() -> OwCurrent {
        OwCurrent {
            name: "Dubai".to_string(),
            main: OwMain { temp: 35.0, humidity: 40, temp_min: 33.0, temp_max: 36.0 },
            weather: vec![OwWeather {
                main: "Clear".to_string(),
                description: "clear sky".to_string(),
            }],
            wind: OwWind { speed: 4.1 },
            coord: OwCoord { lat: 25.26, lon: 55.3 },
            sys: OwSys {
                country: "AE".to_string(),
                // 06:30 and 18:15 local at UTC+0.
                sunrise: 1609482600,
                sunset: 1609524900,
            },
            visibility: 10000.0,
            timezone: 0,
        }
    }

    #[test]
    fn bounds_come_from_the_window() {
        let mut window = vec![entry(30.0, 27.0, 32.0, "Clear"); 8];
        window[2] = entry(34.0, 30.0, 35.0, "Clear");
        window[7] = entry(26.0, 24.0, 31.0, "Clouds");

        let current = sample_current();
        let (max, min) = temperature_bounds(&window, &current.main);

        assert_eq!(max, 35.0);
        assert_eq!(min, 24.0);
        assert!(max >= min);
    }

    #[test]
    fn empty_window_falls_back_to_current_bounds() {
        let current = sample_current();
        let (max, min) = temperature_bounds(&[], &current.main);

        assert_eq!(max, 36.0);
        assert_eq!(min, 33.0);
    }

    #[test]
    fn sun_times_format_as_twelve_hour_clock() {
        // 2021-01-01 06:30 and 18:15 UTC.
        let (sunrise, sunset, day_length) = sun_times(1609482600, 1609524900, 0).unwrap();

        assert_eq!(sunrise, "6:30 AM");
        assert_eq!(sunset, "6:15 PM");
        assert_eq!(day_length, "11h 45m");
    }

    #[test]
    fn sun_times_honor_the_utc_offset() {
        // 01:00 UTC at UTC+5:30 is 6:30 AM local.
        let (sunrise, _, _) = sun_times(1609462800, 1609500000, 19800).unwrap();
        assert_eq!(sunrise, "6:30 AM");
    }

    #[test]
    fn day_length_truncates_seconds() {
        // 11h 59m 59s apart: the stray seconds never round the minute up.
        let (_, _, day_length) = sun_times(1609459200, 1609459200 + 43199, 0).unwrap();
        assert_eq!(day_length, "11h 59m");
    }

    #[test]
    fn out_of_range_offset_is_malformed() {
        let err = sun_times(1609459200, 1609500000, 999_999).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn short_window_has_no_day_parts() {
        let window = vec![entry(20.0, 18.0, 22.0, "Rain"); 4];
        assert!(day_parts(&window).is_empty());
    }

    #[test]
    fn five_samples_make_exactly_three_day_parts() {
        let mut window = vec![entry(20.0, 18.0, 22.0, "Clouds"); 5];
        window[0] = entry(18.0, 16.0, 19.0, "Mist");
        window[2] = entry(24.0, 21.0, 25.0, "Clear");
        window[4] = entry(21.0, 19.0, 23.0, "Rain");

        let parts = day_parts(&window);

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], DayPart {
            name: "Morning".to_string(),
            temp: 18.0,
            condition: "Mist".to_string(),
        });
        assert_eq!(parts[1].name, "Afternoon");
        assert_eq!(parts[1].temp, 24.0);
        assert_eq!(parts[2].name, "Evening");
        assert_eq!(parts[2].condition, "Rain");
    }

    #[test]
    fn snapshot_converts_visibility_to_kilometers() {
        let snapshot = build_snapshot(sample_current(), vec![], 2).unwrap();

        assert_eq!(snapshot.visibility_km, 10.0);
        assert_eq!(snapshot.aqi, 2);
        assert_eq!(snapshot.city, "Dubai");
        assert_eq!(snapshot.country, "AE");
    }

    #[test]
    fn missing_condition_defaults_to_clear() {
        let mut current = sample_current();
        current.weather.clear();

        let snapshot = build_snapshot(current, vec![], DEFAULT_AQI).unwrap();

        assert_eq!(snapshot.condition, "Clear");
        assert_eq!(snapshot.description, "Clear");
    }
}
