use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;

use skycast_core::{
    AdvicePayload, AdviceService, AiBackend, Config, DigestDispatcher, Subscription,
    WeatherService, WeatherSnapshot, digest,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for the weather provider or an AI backend.
    Configure {
        /// "weather", or an AI backend: "gemini", "groq", "cerebras".
        target: String,
    },

    /// Show the dashboard for a city: weather snapshot plus advice.
    Show {
        /// City name; resolution is up to the weather provider.
        city: String,

        /// Print one combined JSON document instead of the dashboard block.
        #[arg(long)]
        json: bool,
    },

    /// Fetch, advise and hand one digest to the stdout dispatcher.
    Digest {
        /// City name.
        city: String,

        /// Recipient identifier, e.g. an email address.
        #[arg(long)]
        to: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { target } => configure(&target),
            Command::Show { city, json } => show(&city, json).await,
            Command::Digest { city, to } => digest_once(&city, &to).await,
        }
    }
}

fn configure(target: &str) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {target}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if target == "weather" {
        config.set_weather_api_key(api_key);
    } else {
        let backend = AiBackend::try_from(target)?;
        config.upsert_ai_api_key(backend, api_key);
    }

    config.save()?;
    println!("Saved credentials for {target}.");
    Ok(())
}

async fn show(city: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let http = skycast_core::http_client()?;

    let weather = WeatherService::new(http.clone(), &config)?;
    let snapshot = weather.fetch(city).await?;

    let advice = AdviceService::from_config(&http, &config);
    let payload = advice.advise(&snapshot).await;

    if json {
        let doc = serde_json::json!({ "weather": snapshot, "advice": payload });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print_dashboard(&snapshot, &payload);
    }

    Ok(())
}

/// Prints the digest to stdout. Stands in for a real transport; failure
/// handling upstream treats it like any other dispatcher.
struct StdoutDispatcher;

#[async_trait::async_trait]
impl DigestDispatcher for StdoutDispatcher {
    async fn dispatch(
        &self,
        recipient: &str,
        snapshot: &WeatherSnapshot,
        advice: &AdvicePayload,
    ) -> anyhow::Result<()> {
        println!(
            "Digest for {recipient}: {}, {} — {} {:.0}°C. {}",
            snapshot.city, snapshot.country, snapshot.condition, snapshot.current_temp,
            advice.summary,
        );
        Ok(())
    }
}

async fn digest_once(city: &str, to: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let http = skycast_core::http_client()?;

    let weather = WeatherService::new(http.clone(), &config)?;
    let advice = AdviceService::from_config(&http, &config);

    let subscriptions =
        [Subscription { recipient: to.to_string(), city: city.to_string() }];

    let delivered =
        digest::deliver_all(&weather, &advice, &StdoutDispatcher, &subscriptions).await;

    if delivered == 0 {
        println!("No digest sent for {city}.");
    }

    Ok(())
}

fn print_dashboard(snapshot: &WeatherSnapshot, advice: &AdvicePayload) {
    println!("{}, {}", snapshot.city, snapshot.country);
    println!(
        "  {:.1}°C  {} ({})",
        snapshot.current_temp, snapshot.condition, snapshot.description
    );
    println!(
        "  High {:.1}°C / Low {:.1}°C",
        snapshot.max_temp, snapshot.min_temp
    );
    println!(
        "  Humidity {}%  Wind {} m/s  AQI {}  Visibility {} km",
        snapshot.humidity, snapshot.wind_speed, snapshot.aqi, snapshot.visibility_km
    );
    println!(
        "  Sunrise {}  Sunset {}  Day length {}",
        snapshot.sunrise, snapshot.sunset, snapshot.day_length
    );

    if !snapshot.day_parts.is_empty() {
        println!();
        for part in &snapshot.day_parts {
            println!("  {:<10} {:>5.1}°C  {}", part.name, part.temp, part.condition);
        }
    }

    println!();
    println!("Advice:");
    println!("  {}", advice.summary);
    println!("  Outfit: {}", advice.outfit);
    println!("  Safety: {}", advice.safety);
}
