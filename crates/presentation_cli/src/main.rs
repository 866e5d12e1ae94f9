//! Waypulse CLI - start a trip and render its progress events
//!
//! A thin renderer over the trip progress engine: it wires the adapters,
//! starts (or resumes) a trip, and prints every emitted event until the
//! trip completes or the user interrupts it.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use application::ports::{GeocodingPort, PositionPort, TripStorePort};
use application::services::{AddressResolver, RouteEstimator, TripProgressEngine};
use domain::events::TripEvent;
use infrastructure::adapters::{GeocodingAdapter, GpsdAdapter, RoutingAdapter};
use infrastructure::config::AppConfig;
use infrastructure::persistence::{InMemoryTripStore, SqliteTripStore};
use integration_geocoding::{NominatimClient, PhotonClient};
use integration_gpsd::GpsdClient;
use integration_routing::OsrmClient;

use domain::value_objects::GeocodingSource;

#[derive(Debug, Parser)]
#[command(name = "waypulse", about = "Live trip progress tracking", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "WAYPULSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start tracking a trip to a destination
    Start {
        /// Destination address
        destination: String,

        /// Optional intermediate stop address
        #[arg(long)]
        via: Option<String>,
    },
    /// Resume a previously persisted trip
    Resume,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,waypulse=debug")
        }))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let engine = build_engine(&config).context("wiring the engine")?;
    let mut events = engine.subscribe();

    match cli.command {
        Command::Start { destination, via } => {
            let trip = engine
                .start_trip(&destination, via.as_deref())
                .await
                .context("starting trip")?;
            println!(
                "Tracking trip to {} ({:.1} km)",
                trip.destination.label, trip.total_distance_km
            );
        },
        Command::Resume => {
            let trip = engine.resume_trip().await.context("resuming trip")?;
            println!(
                "Resumed trip to {} ({:.1} of {:.1} km covered)",
                trip.destination.label, trip.distance_traveled_km, trip.total_distance_km
            );
        },
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if render_event(&event) {
                        break;
                    }
                },
                Err(err) => {
                    warn!(error = %err, "Event stream interrupted");
                    break;
                },
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Stopping trip (state retained; use `waypulse resume` to continue)");
                engine.stop_trip().await.ok();
                break;
            },
        }
    }

    Ok(())
}

/// Render one event; returns true when the trip is over
fn render_event(event: &TripEvent) -> bool {
    match event {
        TripEvent::ProgressUpdate(update) => {
            let eta = update
                .eta
                .as_ref()
                .map_or_else(String::new, |eta| format!(" | ETA: {}", eta.display));
            println!(
                "{:5.1}% | {:.1} km down, {:.1} km to go{eta}",
                update.progress_percent, update.distance_traveled_km,
                update.remaining_distance_km
            );
            false
        },
        TripEvent::NextStopProgress(stop) => {
            if stop.reached {
                println!("Next stop reached!");
            } else {
                let eta = stop
                    .eta
                    .as_ref()
                    .map_or_else(String::new, |eta| format!(" | ETA: {}", eta.display));
                println!(
                    "  stop: {:5.1}% | {:.1} km to go{eta}",
                    stop.progress_percent, stop.distance_to_stop_km
                );
            }
            false
        },
        TripEvent::TripComplete(trip) => {
            println!(
                "Arrived at {} after {:.1} km. Enjoy!",
                trip.destination.label, trip.total_distance_km
            );
            true
        },
        TripEvent::LocationError(kind) => {
            println!("Location problem: {kind}");
            false
        },
    }
}

/// Construct the engine with adapters per the configuration
fn build_engine(config: &AppConfig) -> anyhow::Result<Arc<TripProgressEngine>> {
    let mut backends: Vec<Arc<dyn GeocodingPort>> = Vec::new();
    for name in &config.geocoding.backend_order {
        match name.as_str() {
            "nominatim" => {
                let client = NominatimClient::new(&config.geocoding.nominatim)
                    .context("nominatim client")?;
                backends.push(Arc::new(GeocodingAdapter::new(
                    Arc::new(client),
                    GeocodingSource::Nominatim,
                    config.retry.clone(),
                )));
            },
            "photon" => {
                let client =
                    PhotonClient::new(&config.geocoding.photon).context("photon client")?;
                backends.push(Arc::new(GeocodingAdapter::new(
                    Arc::new(client),
                    GeocodingSource::Photon,
                    config.retry.clone(),
                )));
            },
            other => bail!("Unknown geocoding backend in backend_order: {other}"),
        }
    }
    if backends.is_empty() {
        bail!("geocoding.backend_order must name at least one backend");
    }

    let routing = OsrmClient::new(&config.routing).context("osrm client")?;
    let positions: Arc<dyn PositionPort> = Arc::new(GpsdAdapter::new(Arc::new(
        GpsdClient::new(config.gpsd.clone()),
    )));
    let store: Arc<dyn TripStorePort> = match &config.persistence.db_path {
        Some(path) => Arc::new(SqliteTripStore::open(path).context("opening trip store")?),
        None => Arc::new(InMemoryTripStore::new()),
    };

    Ok(Arc::new(TripProgressEngine::new(
        AddressResolver::new(backends),
        RouteEstimator::new(Arc::new(RoutingAdapter::new(
            Arc::new(routing),
            config.retry.clone(),
        ))),
        positions,
        store,
        config.engine.clone(),
    )))
}
