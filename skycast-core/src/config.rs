use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

/// Credentials for one external service (weather provider or AI backend).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub api_key: String,
}

/// AI backend identifiers, listed in chain priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiBackend {
    Gemini,
    Groq,
    Cerebras,
}

impl AiBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiBackend::Gemini => "gemini",
            AiBackend::Groq => "groq",
            AiBackend::Cerebras => "cerebras",
        }
    }

    pub const fn all() -> &'static [AiBackend] {
        &[AiBackend::Gemini, AiBackend::Groq, AiBackend::Cerebras]
    }
}

impl std::fmt::Display for AiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AiBackend {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "gemini" => Ok(AiBackend::Gemini),
            "groq" => Ok(AiBackend::Groq),
            "cerebras" => Ok(AiBackend::Cerebras),
            _ => Err(anyhow!(
                "Unknown AI backend '{value}'. Supported backends: gemini, groq, cerebras."
            )),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// The core only consumes the values; the CLI owns interactive entry.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [weather]
    /// api_key = "..."
    pub weather: Option<ApiCredentials>,

    /// Example TOML:
    /// [ai.gemini]
    /// api_key = "..."
    ///
    /// A backend without an entry here is silently disabled.
    #[serde(default)]
    pub ai: HashMap<String, ApiCredentials>,
}

impl Config {
    /// API key for the weather provider, if present.
    pub fn weather_api_key(&self) -> Option<&str> {
        self.weather.as_ref().map(|cfg| cfg.api_key.as_str())
    }

    pub fn set_weather_api_key(&mut self, api_key: String) {
        self.weather = Some(ApiCredentials { api_key });
    }

    /// API key for one AI backend, if present.
    pub fn ai_api_key(&self, backend: AiBackend) -> Option<&str> {
        self.ai.get(backend.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_backend_configured(&self, backend: AiBackend) -> bool {
        self.ai_api_key(backend).is_some()
    }

    /// Set/replace the API key for one AI backend.
    pub fn upsert_ai_api_key(&mut self, backend: AiBackend, api_key: String) {
        self.ai.insert(backend.as_str().to_string(), ApiCredentials { api_key });
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
