use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::AdviceProvider;
use crate::model::WeatherSnapshot;

/// OpenAI-style chat-completion backend.
///
/// One struct covers every family that speaks the
/// `choices[].message.content` shape; each instance owns its endpoint,
/// model id and bearer credential.
pub struct ChatCompletionProvider {
    name: &'static str,
    http: Client,
    api_key: Option<String>,
    url: String,
    model: &'static str,
}

impl ChatCompletionProvider {
    pub fn groq(http: Client, api_key: Option<String>) -> Self {
        Self {
            name: "groq",
            http,
            api_key,
            url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile",
        }
    }

    pub fn cerebras(http: Client, api_key: Option<String>) -> Self {
        Self {
            name: "cerebras",
            http,
            api_key,
            url: "https://api.cerebras.ai/v1/chat/completions".to_string(),
            model: "llama3.1-8b",
        }
    }

    /// Arbitrary endpoint variant. Tests point this at a mock server.
    pub fn custom(
        name: &'static str,
        http: Client,
        api_key: Option<String>,
        url: impl Into<String>,
        model: &'static str,
    ) -> Self {
        Self { name, http, api_key, url: url.into(), model }
    }
}

#[async_trait]
impl AdviceProvider for ChatCompletionProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, _snapshot: &WeatherSnapshot, prompt: &str) -> Option<String> {
        let api_key = self.api_key.as_deref()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let res = match self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => {
                debug!(backend = self.name, error = %err, "chat completion request failed");
                return None;
            }
        };

        if !res.status().is_success() {
            debug!(backend = self.name, status = %res.status(), "chat completion rejected");
            return None;
        }

        match res.json::<ChatCompletionResponse>().await {
            Ok(parsed) => parsed.into_text(),
            Err(err) => {
                debug!(backend = self.name, error = %err, "malformed chat completion response");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()?
            .message
            .map(|message| message.content)
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}
