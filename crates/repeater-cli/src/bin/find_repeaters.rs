//! Find amateur radio repeaters along a driving route.
//!
//! Credentials and provider tuning come from the environment
//! (`GOOGLE_MAPS_API_KEY`, `REPEATERBOOK_USER_AGENT`, ...).

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use repeater_cli::render_report;
use repeater_core::{Band, DEFAULT_SAMPLE_INTERVAL_MI};
use repeater_search::{
    ProgressUpdate, SearchConfig, SearchPipeline, SearchRequest, DEFAULT_SEARCH_RADIUS_MI,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Search for repeaters along the driving route between two places
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Start address or ZIP code
    #[arg(long)]
    origin: String,

    /// End address or ZIP code
    #[arg(long)]
    destination: String,

    /// Search radius around each sample point, in miles
    #[arg(long, default_value_t = DEFAULT_SEARCH_RADIUS_MI)]
    radius: f64,

    /// Spacing between sample points, in miles
    #[arg(long, default_value_t = DEFAULT_SAMPLE_INTERVAL_MI)]
    interval: f64,

    /// Band to include (6m, 2m, 1.25m, 70cm); repeat for several. Defaults to 2m and 70cm
    #[arg(long = "band")]
    bands: Vec<Band>,

    /// Print the full result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("repeater_search=warn".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut request = SearchRequest::new(args.origin, args.destination)
        .with_radius(args.radius)
        .with_interval(args.interval);
    if !args.bands.is_empty() {
        request = request.with_bands(args.bands);
    }

    let config = SearchConfig::from_env();
    let pipeline =
        SearchPipeline::from_config(&config).context("failed to build provider HTTP clients")?;

    let quiet = args.json;
    let progress = move |update: ProgressUpdate| {
        if !quiet {
            eprintln!("{}", update.message);
        }
    };
    let result = pipeline.find_repeaters_along_route(&request, &progress).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_report(&result));
    }

    // The error is already part of the printed output.
    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
