use serde::{Deserialize, Serialize};

/// One labeled segment of the near-term forecast narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPart {
    pub name: String,
    pub temp: f64,
    pub condition: String,
}

/// Canonical provider-independent weather record, built fresh per request
/// and immutable afterwards.
///
/// Either every field below is populated or the aggregation fails as a
/// whole; only `aqi` may silently degrade to the neutral index when the
/// air-quality lookup fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    pub current_temp: f64,
    pub condition: String,
    pub description: String,
    pub humidity: u8,
    /// As reported by the provider (m/s in metric mode), never converted.
    pub wind_speed: f64,
    /// Provider scale, 1 = best.
    pub aqi: i32,
    /// Bounds over the near-term forecast window.
    pub max_temp: f64,
    pub min_temp: f64,
    pub visibility_km: f64,
    /// Local clock time, e.g. "6:30 AM".
    pub sunrise: String,
    pub sunset: String,
    /// e.g. "11h 45m", minutes truncated.
    pub day_length: String,
    /// Morning/Afternoon/Evening; empty when the forecast window is short.
    pub day_parts: Vec<DayPart>,
}

/// Structured advice shown to end users.
///
/// Always a valid object: fields the model omits fall back to empty strings
/// rather than null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvicePayload {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub outfit: String,
    #[serde(default)]
    pub safety: String,
}

impl AdvicePayload {
    /// Deterministic payload used when every AI backend is down.
    pub fn fallback(city: &str) -> Self {
        Self {
            summary: format!("Enjoy the atmosphere in {city}."),
            outfit: "Wear comfortable clothes suitable for the weather.".to_string(),
            safety: "No specific hazards.".to_string(),
        }
    }
}
