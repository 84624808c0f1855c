//! CLI entry point for the BusTime feed tool.
//!
//! Provides subcommands for pulling route geometry, live bus positions and stop
//! predictions from the feed, fetching raw documents, and decoding saved snapshots.

use anyhow::{Context, Result};
use bustime_feed::{
    config::{DEFAULT_SOURCE, FeedConfig},
    decode::{
        decode_bus_list, decode_buses_for_route, decode_route_points, decode_stop_predictions,
        validate_route_points,
    },
    fetch::{BasicClient, FeedResponse, fetch, fetch_and_archive},
    model::Route,
    output::{append_stop_listing, to_json, write_stop_listing},
};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bustime_feed")]
#[command(about = "A tool to pull route geometry and live data from a BusTime XML feed", long_about = None)]
struct Cli {
    /// Feed source to query
    #[arg(short, long, global = true, default_value = DEFAULT_SOURCE)]
    source: String,

    /// Optional: directory to archive raw XML responses in
    #[arg(long, global = true)]
    save_raw: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a route's geometry and write its stop listings as CSV
    Stops {
        /// Route identifier, e.g. 119
        route: String,

        /// CSV file to append stop listings to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Fetch live bus positions for a route
    Buses {
        /// Route identifier
        route: String,

        /// Use the all-buses endpoint, which nests extra fields per bus
        #[arg(short, long, default_value_t = false)]
        all: bool,
    },
    /// Fetch arrival predictions for a stop
    Predictions {
        /// Stop identifier
        stop: String,

        /// Optional: only predictions for this route
        #[arg(short, long)]
        route: Option<String>,
    },
    /// Fetch a raw document for any configured operation
    Fetch {
        /// Operation name, e.g. route_points or time_and_temp
        operation: String,

        /// Query parameters as key=value, kept in the given order
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Decode a saved XML snapshot
    Decode {
        /// Message shape of the snapshot
        #[arg(value_enum)]
        kind: DocumentKind,

        /// Path to the XML file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DocumentKind {
    Routes,
    Buses,
    Predictions,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bustime_feed.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bustime_feed.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = FeedConfig::from_env()?;
    let client = BasicClient::new(config.timeout)?;
    let feed = Feed {
        client: &client,
        config: &config,
        source: &cli.source,
        save_raw: cli.save_raw.as_deref(),
    };

    let result = run(&feed, cli.command).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Command failed");
    }
    result
}

async fn run(feed: &Feed<'_>, command: Commands) -> Result<()> {
    match command {
        Commands::Stops { route, output } => stops(feed, &route, output.as_deref()).await,
        Commands::Buses { route, all } => {
            let operation = if all { "all_buses" } else { "buses_for_route" };
            let response = feed.get(operation, &[("route", route.as_str())]).await?;
            let buses = if all {
                decode_bus_list(&response.body)?
            } else {
                decode_buses_for_route(&response.body)?
            };
            info!(route = %route, buses = buses.len(), "Buses decoded");
            println!("{}", to_json(&buses)?);
            Ok(())
        }
        Commands::Predictions { stop, route } => {
            let mut params = vec![("stop", stop.as_str())];
            if let Some(route) = &route {
                params.push(("route", route.as_str()));
            }
            let response = feed.get("stop_predictions", &params).await?;
            let predictions = decode_stop_predictions(&response.body)?;
            info!(stop = %stop, predictions = predictions.len(), "Predictions decoded");
            println!("{}", to_json(&predictions)?);
            Ok(())
        }
        Commands::Fetch { operation, params } => {
            if feed.config.operation_path(&operation).is_none() {
                anyhow::bail!(
                    "unknown operation '{operation}', expected one of: {}",
                    feed.config.operations().join(", ")
                );
            }
            let params = parse_params(&params)?;
            let response = feed.get(&operation, &params).await?;
            std::io::stdout().write_all(&response.body)?;
            Ok(())
        }
        Commands::Decode { kind, file } => decode_file(kind, &file),
    }
}

/// Shared request settings for the subcommands.
struct Feed<'a> {
    client: &'a BasicClient,
    config: &'a FeedConfig,
    source: &'a str,
    save_raw: Option<&'a Path>,
}

impl Feed<'_> {
    async fn get(&self, operation: &str, params: &[(&str, &str)]) -> Result<FeedResponse> {
        let response = match self.save_raw {
            Some(dir) => {
                fetch_and_archive(self.client, self.config, self.source, operation, params, dir)
                    .await?
            }
            None => fetch(self.client, self.config, self.source, operation, params).await?,
        };
        info!(
            operation,
            attempts = response.attempts,
            bytes = response.body.len(),
            fetched_at = %response.timestamp,
            "Feed fetched"
        );
        Ok(response)
    }
}

/// Fetches a route's geometry and emits the stop listing of each of its paths.
#[tracing::instrument(skip(feed), fields(source = %feed.source))]
async fn stops(feed: &Feed<'_>, route_id: &str, output: Option<&str>) -> Result<()> {
    let response = feed.get("route_points", &[("route", route_id)]).await?;

    if !validate_route_points(&response.body)? {
        warn!(route = route_id, "Route not valid: feed returned no paths");
        anyhow::bail!("route {route_id} has no paths in the feed");
    }

    // The feed answers with a single route document.
    let route = decode_route_points(&response.body)?
        .into_iter()
        .next()
        .context("route points document decoded to no routes")?;
    emit_stop_listings(route, output)
}

fn emit_stop_listings(route: Route, output: Option<&str>) -> Result<()> {
    let route_id = route.id.clone();
    let mut rows = Vec::new();
    for path in route.into_paths() {
        info!(
            route = %route_id,
            path_id = %path.id,
            d = %path.d,
            dd = %path.dd,
            stops = path.stops.len(),
            "Path decoded"
        );
        rows.extend(path.stop_listing());
    }
    match output {
        Some(file) => append_stop_listing(file, &rows),
        None => write_stop_listing(std::io::stdout().lock(), &rows),
    }
}

fn decode_file(kind: DocumentKind, file: &Path) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let json = match kind {
        DocumentKind::Routes => to_json(&decode_route_points(&bytes)?)?,
        DocumentKind::Buses => to_json(&decode_bus_list(&bytes)?)?,
        DocumentKind::Predictions => to_json(&decode_stop_predictions(&bytes)?)?,
    };
    println!("{json}");
    Ok(())
}

/// Splits `key=value` arguments, keeping their order.
fn parse_params(raw: &[String]) -> Result<Vec<(&str, &str)>> {
    raw.iter()
        .map(|param| {
            param
                .split_once('=')
                .with_context(|| format!("parameter '{param}' is not of the form key=value"))
        })
        .collect()
}
