use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use parking_map::map::headless::HeadlessSurface;
use parking_map::map::layers::{legend, GARAGE_LAYER, METER_LAYER, SEGMENT_LAYER};
use parking_map::services::geocoding::MapTilerGeocoder;
use parking_map::services::nearby::NearbyClient;
use parking_map::services::notify::LogNotifier;
use parking_map::{MapEngine, SyncConfig, SyncStatus};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

enum SyncAction {
    Nearby,
    Search(String),
}

impl SyncAction {
    fn from_env() -> anyhow::Result<Self> {
        let action = env::var("ACTION").unwrap_or_else(|_| "NEARBY".to_string());
        match action.as_str() {
            "NEARBY" => Ok(Self::Nearby),
            "SEARCH" => {
                let query = env::var("QUERY").context("SEARCH needs QUERY to be set")?;
                Ok(Self::Search(query))
            }
            other => Err(anyhow!("Invalid action `{}`", other)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try the parent directory first so this also works from inside the crate
    dotenvy::from_filename("../.env")
        .or_else(|_| dotenvy::dotenv())
        .ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,parking_map=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let action = SyncAction::from_env()?;
    let config = SyncConfig::from_env().context("map configuration is incomplete")?;

    let client = NearbyClient::new(&config)?;
    let mut engine = MapEngine::new(
        config.clone(),
        HeadlessSurface::new(),
        client,
        Arc::new(LogNotifier),
    )?;
    let handle = engine.handle();

    engine.start();
    handle.style_loaded()?;

    if let SyncAction::Search(query) = action {
        let geocoder = MapTilerGeocoder::new(&config)?;
        match handle.locate(&geocoder, &query).await {
            Ok(center) => tracing::info!(lat = center.lat, lng = center.long, "located '{}'", query),
            Err(e) => tracing::warn!("{} ({})", e.user_message(), e),
        }
    }

    let drive = async {
        while engine.step().await {
            let done = matches!(
                engine.status(),
                SyncStatus::Ready { .. } | SyncStatus::Unavailable { .. }
            );
            if done && engine.is_settled() {
                break;
            }
        }
    };
    tokio::time::timeout(SESSION_TIMEOUT, drive)
        .await
        .context("timed out waiting for nearby parking data")?;

    let surface = engine.surface();
    println!("Status: {:?}", engine.status());
    for layer in [GARAGE_LAYER, METER_LAYER, SEGMENT_LAYER] {
        println!("{:>14}: {} visible", layer, surface.visible_features(layer).len());
    }
    println!("Legend:");
    for entry in legend() {
        println!("  {:<7} {}", entry.label, entry.color);
    }

    handle.shutdown().ok();
    Ok(())
}
