use thiserror::Error;

/// Construction-time failures: a component cannot operate at all.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No API key configured for '{0}'.\n\
         Hint: run `skycast configure {0}` and enter your API key."
    )]
    MissingApiKey(&'static str),
}

/// Failures of a single aggregation request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The primary current-conditions call returned a non-success status.
    /// Geocoding is delegated to the provider, so this is the only
    /// "unknown city" signal the aggregator gets.
    #[error("city '{0}' not found")]
    CityNotFound(String),

    /// A mandatory outbound call failed to complete usably. Timeouts land
    /// here too.
    #[error("weather request failed: {0}")]
    Network(String),

    /// A successful response was missing required fields.
    #[error("unexpected provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}
