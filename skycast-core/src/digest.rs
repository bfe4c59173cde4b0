//! Digest dispatch boundary.
//!
//! The core hands a recipient, snapshot and advice payload to a dispatcher
//! and treats transport failure as non-fatal; rendering and transport live
//! entirely behind the trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    advice::AdviceService,
    model::{AdvicePayload, WeatherSnapshot},
    weather::WeatherService,
};

/// Renders and sends one digest.
#[async_trait]
pub trait DigestDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        recipient: &str,
        snapshot: &WeatherSnapshot,
        advice: &AdvicePayload,
    ) -> anyhow::Result<()>;
}

/// One digest subscription: where to send and which city to report on.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub recipient: String,
    pub city: String,
}

/// Fire-and-forget delivery: transport failure is logged, never bubbled
/// back into the aggregation/advice path.
pub async fn deliver(
    dispatcher: &dyn DigestDispatcher,
    recipient: &str,
    snapshot: &WeatherSnapshot,
    advice: &AdvicePayload,
) {
    if let Err(err) = dispatcher.dispatch(recipient, snapshot, advice).await {
        warn!(recipient, error = %err, "digest delivery failed");
    }
}

/// Walk `subscriptions`, running fetch, advise and dispatch per entry.
///
/// Failures are isolated per recipient: a city that cannot be fetched is
/// logged and skipped, and the remaining digests still go out. Returns how
/// many digests were handed to the dispatcher.
pub async fn deliver_all(
    weather: &WeatherService,
    advice: &AdviceService,
    dispatcher: &dyn DigestDispatcher,
    subscriptions: &[Subscription],
) -> usize {
    let mut delivered = 0;

    for sub in subscriptions {
        let snapshot = match weather.fetch(&sub.city).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    recipient = %sub.recipient,
                    city = %sub.city,
                    error = %err,
                    "skipping digest, weather fetch failed"
                );
                continue;
            }
        };

        let payload = advice.advise(&snapshot).await;
        deliver(dispatcher, &sub.recipient, &snapshot, &payload).await;
        delivered += 1;

        info!(recipient = %sub.recipient, city = %sub.city, "digest dispatched");
    }

    delivered
}
