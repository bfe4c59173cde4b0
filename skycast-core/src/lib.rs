//! Core library for the `skycast` weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather aggregation engine (current conditions + forecast + air quality)
//! - The AI advice chain and its backend providers
//! - The digest dispatch boundary
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

use std::time::Duration;

use anyhow::Context;

pub mod advice;
pub mod config;
pub mod digest;
pub mod error;
pub mod model;
pub mod weather;

pub use advice::{AdviceProvider, AdviceService};
pub use config::{AiBackend, ApiCredentials, Config};
pub use digest::{DigestDispatcher, Subscription};
pub use error::{ConfigError, FetchError};
pub use model::{AdvicePayload, DayPart, WeatherSnapshot};
pub use weather::WeatherService;

/// Upper bound on every outbound HTTP call; a timed-out call fails like any
/// other network error.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by all components. Clones are cheap and
/// share the connection pool.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}
