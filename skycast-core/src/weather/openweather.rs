use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Raw client for the three OpenWeather endpoints the aggregator consumes.
///
/// Every call carries the API key as a query parameter. The base URL is
/// injectable so tests can point it at a mock host.
#[derive(Debug, Clone)]
pub(crate) struct OpenWeatherGateway {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherGateway {
    pub fn new(http: Client, api_key: String, base_url: String) -> Self {
        Self { http, api_key, base_url }
    }

    /// Current conditions by city name. Geocoding is the provider's job:
    /// any non-success status here means the city could not be resolved.
    pub async fn current(&self, city: &str) -> Result<OwCurrent, FetchError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(FetchError::CityNotFound(city.to_string()));
        }

        let body = res.text().await?;
        serde_json::from_str(&body)
            .map_err(|err| FetchError::Malformed(format!("current weather JSON: {err}")))
    }

    /// 3-hourly forecast by city name.
    pub async fn forecast(&self, city: &str) -> Result<OwForecast, FetchError> {
        let url = format!("{}/data/2.5/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "forecast request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|err| FetchError::Malformed(format!("forecast JSON: {err}")))
    }

    /// Air-quality index for coordinates. The caller treats any error here
    /// as a tolerated failure.
    pub async fn air_quality(&self, lat: f64, lon: f64) -> Result<i32, FetchError> {
        let url = format!("{}/data/2.5/air_pollution", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "air quality request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        let parsed: OwPollution = serde_json::from_str(&body)
            .map_err(|err| FetchError::Malformed(format!("air quality JSON: {err}")))?;

        parsed
            .list
            .first()
            .map(|entry| entry.main.aqi)
            .ok_or_else(|| FetchError::Malformed("air quality response contained no samples".into()))
    }
}

// Provider-shaped records. Fields absent from a payload that the snapshot
// requires fail the parse; fields the snapshot can default are optional.

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OwMain {
    pub temp: f64,
    pub humidity: u8,
    pub temp_min: f64,
    pub temp_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OwWeather {
    pub main: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWind {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwSys {
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrent {
    #[serde(default)]
    pub name: String,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    pub wind: OwWind,
    pub coord: OwCoord,
    pub sys: OwSys,
    /// Meters.
    #[serde(default)]
    pub visibility: f64,
    /// Seconds east of UTC.
    pub timezone: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OwForecastEntry {
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecast {
    pub list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwAqiMain {
    pub aqi: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwPollutionEntry {
    pub main: OwAqiMain,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwPollution {
    #[serde(default)]
    pub list: Vec<OwPollutionEntry>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
