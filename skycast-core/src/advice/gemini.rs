use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::AdviceProvider;
use crate::model::WeatherSnapshot;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model identifiers tried against the Gemini family, in priority order.
const MODELS: [&str; 3] = [
    "gemini-2.0-flash-exp",
    "gemini-2.5-flash-lite",
    "gemini-1.5-flash",
];

/// Gemini backend with an internal model fallback list: each model id is
/// tried against the same endpoint family, stopping at the first HTTP
/// success.
pub struct GeminiProvider {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiProvider {
    /// A provider without a key is inert: it reports itself unusable
    /// without touching the network.
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self::with_base_url(http, api_key, DEFAULT_BASE_URL)
    }

    /// Alternate host, used by tests.
    pub fn with_base_url(
        http: Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self { http, api_key, base_url: base_url.into() }
    }
}

#[async_trait]
impl AdviceProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, _snapshot: &WeatherSnapshot, prompt: &str) -> Option<String> {
        let api_key = self.api_key.as_deref()?;

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        for model in MODELS {
            let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);

            let res = match self
                .http
                .post(&url)
                .query(&[("key", api_key)])
                .json(&body)
                .send()
                .await
            {
                Ok(res) => res,
                Err(err) => {
                    debug!(model, error = %err, "gemini request failed, trying next model");
                    continue;
                }
            };

            if !res.status().is_success() {
                debug!(model, status = %res.status(), "gemini model rejected, trying next");
                continue;
            }

            // First HTTP success settles this backend, text or not.
            return match res.json::<GenerateContentResponse>().await {
                Ok(parsed) => {
                    debug!(model, "gemini answered");
                    parsed.into_text()
                }
                Err(err) => {
                    debug!(model, error = %err, "malformed gemini response");
                    None
                }
            };
        }

        debug!("all gemini models exhausted");
        None
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}
