//! Stratowatch agent - periodic balloon-constellation snapshot monitor.
//!
//! Polls the snapshot endpoint, runs the correlation engine over each
//! payload, and renders the resulting frame as a terminal report (or JSON).

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use stratowatch_core::refresh::{
    ConstellationSource, RefreshConfig, RefreshController, ToggleState,
};
use stratowatch_core::summary::MissingPollutantPolicy;
use stratowatch_env::TokioContext;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod feed;
mod report;
mod runner;

use feed::HttpSnapshotFeed;
use runner::{Runner, RunnerOptions};

/// Stratowatch constellation monitor
#[derive(Parser, Debug)]
#[command(name = "stratowatch")]
#[command(about = "Monitor a sounding-balloon constellation feed", long_about = None)]
struct Args {
    /// Snapshot endpoint URL
    #[arg(short, long, default_value = "http://127.0.0.1:8000/api/data")]
    endpoint: String,

    /// Refresh interval in minutes
    #[arg(short, long, default_value = "15")]
    interval: u64,

    /// Constellation link threshold in kilometers
    #[arg(short, long, default_value = "500")]
    threshold: f64,

    /// Request the air-quality layer
    #[arg(long)]
    air_quality: bool,

    /// Request the weather layer
    #[arg(long)]
    weather: bool,

    /// Request the aircraft layer plus safety analysis
    #[arg(long)]
    air_traffic: bool,

    /// Always recompute constellation links locally, ignoring feed links
    #[arg(long)]
    local_constellation: bool,

    /// Average pollutants only over stations that report them
    #[arg(long)]
    skip_missing_pollutants: bool,

    /// Fetch one snapshot, print the report, exit
    #[arg(long)]
    once: bool,

    /// Emit frames as JSON for downstream tooling
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RefreshConfig {
        link_threshold_m: args.threshold * 1_000.0,
        refresh_interval: Duration::from_secs(args.interval * 60),
        constellation_source: if args.local_constellation {
            ConstellationSource::AlwaysLocal
        } else {
            ConstellationSource::FeedThenLocal
        },
        missing_pollutant_policy: if args.skip_missing_pollutants {
            MissingPollutantPolicy::Skip
        } else {
            MissingPollutantPolicy::ZeroFill
        },
        ..Default::default()
    };
    let toggles = ToggleState {
        air_quality: args.air_quality,
        weather: args.weather,
        air_traffic: args.air_traffic,
        ..Default::default()
    };

    if !args.json {
        info!("Stratowatch agent v{}", env!("CARGO_PKG_VERSION"));
        info!("Endpoint: {}", args.endpoint);
        info!(
            "Link threshold: {:.0} km, refresh every {} min",
            args.threshold, args.interval
        );
    }

    let feed = Arc::new(HttpSnapshotFeed::new(
        args.endpoint,
        config.fetch_timeout,
    )?);
    let controller = RefreshController::with_toggles(config, toggles);
    let runner = Runner::new(
        controller,
        Arc::new(TokioContext::new()),
        feed,
        RunnerOptions {
            once: args.once,
            json: args.json,
        },
    );
    runner.run().await
}
