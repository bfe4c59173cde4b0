//! AI advice chain.
//!
//! Renders one prompt per snapshot and walks the configured backends in
//! priority order until one returns parseable advice. Never fails outward:
//! when every backend is exhausted the caller gets the deterministic
//! fallback payload instead.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::{
    config::{AiBackend, Config},
    model::{AdvicePayload, WeatherSnapshot},
};

pub mod chat;
pub mod gemini;

use chat::ChatCompletionProvider;
use gemini::GeminiProvider;

/// AQI level above which the prompt tells the model to recommend a mask.
pub const AQI_MASK_THRESHOLD: i32 = 150;

/// One language-model backend.
///
/// `None` means "unusable right now": missing credential, HTTP failure, or
/// a response body that carried no text. Implementations never error across
/// this boundary.
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, snapshot: &WeatherSnapshot, prompt: &str) -> Option<String>;
}

/// Tries providers sequentially in a fixed priority order, first success
/// wins. Sequential on purpose: running the chain in parallel would spend
/// quota on backends whose answers get discarded.
pub struct AdviceService {
    providers: Vec<Box<dyn AdviceProvider>>,
}

impl AdviceService {
    pub fn new(providers: Vec<Box<dyn AdviceProvider>>) -> Self {
        Self { providers }
    }

    /// Build the default chain from configured credentials. Backends
    /// without a key stay in the chain but disable themselves.
    pub fn from_config(http: &Client, config: &Config) -> Self {
        Self::new(vec![
            Box::new(GeminiProvider::new(
                http.clone(),
                config.ai_api_key(AiBackend::Gemini).map(str::to_string),
            )),
            Box::new(ChatCompletionProvider::groq(
                http.clone(),
                config.ai_api_key(AiBackend::Groq).map(str::to_string),
            )),
            Box::new(ChatCompletionProvider::cerebras(
                http.clone(),
                config.ai_api_key(AiBackend::Cerebras).map(str::to_string),
            )),
        ])
    }

    /// Produce advice for `snapshot`. Infallible: every provider failure is
    /// absorbed and the fallback payload closes the chain.
    pub async fn advise(&self, snapshot: &WeatherSnapshot) -> AdvicePayload {
        let prompt = render_prompt(snapshot);

        for provider in &self.providers {
            info!(provider = provider.name(), "requesting advice");

            let Some(text) = provider.generate(snapshot, &prompt).await else {
                warn!(provider = provider.name(), "backend unusable, trying next");
                continue;
            };

            if text.trim().is_empty() {
                warn!(provider = provider.name(), "backend returned no text, trying next");
                continue;
            }

            let cleaned = extract_json(&text);
            match serde_json::from_str::<AdvicePayload>(&cleaned) {
                Ok(payload) => {
                    info!(provider = provider.name(), "advice accepted");
                    return payload;
                }
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        error = %err,
                        "unparseable advice, trying next"
                    );
                }
            }
        }

        info!(city = %snapshot.city, "all advice backends exhausted, using fallback");
        AdvicePayload::fallback(&snapshot.city)
    }
}

fn render_prompt(snapshot: &WeatherSnapshot) -> String {
    format!(
        "Role: You are a smart, practical style companion who gives helpful daily advice.\n\
         Context: {city}, {country}.\n\
         Data: Temp {temp:.0}°C, {condition}. Humidity {humidity}%. Wind {wind}m/s. AQI {aqi}.\n\
         \n\
         Task: Return a FLAT JSON object (no nesting) with keys 'summary', 'outfit' and 'safety'.\n\
         \n\
         Guidelines:\n\
         - 'summary': A warm, human-like summary of the weather feel (max 2 sentences).\n\
         - 'outfit': Suggest comfortable, smart-casual or streetwear options suitable for \
         daily life. Avoid overly luxurious items unless strictly necessary for extreme cold.\n\
         - 'safety': Practical tips.\n\
           * IF Rain/Drizzle -> Suggest Umbrella/Raincoat.\n\
           * IF AQI > {threshold} -> Suggest a Mask.\n\
           * IF Clear/Sunny -> Suggest Sunscreen/Sunglasses.\n\
           * ELSE -> 'No specific hazards.'\n",
        city = snapshot.city,
        country = snapshot.country,
        temp = snapshot.current_temp,
        condition = snapshot.condition,
        humidity = snapshot.humidity,
        wind = snapshot.wind_speed,
        aqi = snapshot.aqi,
        threshold = AQI_MASK_THRESHOLD,
    )
}

/// Extract the JSON object embedded in `text`.
///
/// Models wrap their JSON in prose or code fences; everything between the
/// first `{` and the last `}` is taken verbatim. Text without a brace pair
/// comes back trimmed so the caller's parse can reject it.
pub fn extract_json(text: &str) -> String {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => text[start..=end].to_string(),
        _ => text.trim().to_string(),
    }
}
