//! Endpoint tables and client settings.
//!
//! The BusTime endpoints are fixed: a base address per source and a path per
//! operation. Extra or replacement sources can be supplied as a JSON object on disk:
//! ```json
//! {
//!   "nj": "http://mybusnow.njtransit.com/bustime/map/"
//! }
//! ```

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::fetch::RetryPolicy;

pub const DEFAULT_SOURCE: &str = "nj";

const SOURCES: &[(&str, &str)] = &[("nj", "http://mybusnow.njtransit.com/bustime/map/")];

const OPERATIONS: &[(&str, &str)] = &[
    ("all_buses", "getBusesForRouteAll.jsp"),
    ("route_points", "getRoutePoints.jsp"),
    ("pattern_points", "getPatternPoints.jsp"),
    ("stop_predictions", "getStopPredictions.jsp"),
    ("bus_predictions", "getBusPredictions.jsp"),
    ("buses_for_route", "getBusesForRoute.jsp"),
    ("schedules", "schedules.jsp"),
    ("time_and_temp", "getTimeAndTemp.jsp"),
    ("route_directions_xml", "routeDirectionStopAsXML"),
];

/// Settings for talking to the feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    sources: HashMap<String, String>,
    operations: HashMap<String, String>,
    pub retry: RetryPolicy,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let table = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            sources: table(SOURCES),
            operations: table(OPERATIONS),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl FeedConfig {
    /// Builds the config from defaults overridden by environment variables:
    /// `BUSTIME_MAX_ATTEMPTS`, `BUSTIME_RETRY_DELAY_SECS`, `BUSTIME_TIMEOUT_SECS` and
    /// `BUSTIME_SOURCES_FILE` (path to a JSON source table).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(max_attempts) = parse_var(&lookup, "BUSTIME_MAX_ATTEMPTS")? {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(secs) = parse_var(&lookup, "BUSTIME_RETRY_DELAY_SECS")? {
            config.retry.delay = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "BUSTIME_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("BUSTIME_SOURCES_FILE") {
            config.load_sources(&path)?;
        }

        Ok(config)
    }

    /// Merges a JSON object of `source -> base address` into the source table.
    pub fn load_sources(&mut self, path: &str) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source table '{path}'"))?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Source table '{path}' is not a JSON object of strings"))?;
        self.sources.extend(entries);
        Ok(())
    }

    /// Adds or replaces the base address for `name`.
    pub fn with_source(mut self, name: &str, base_url: &str) -> Self {
        self.sources.insert(name.to_string(), base_url.to_string());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the base address for `source`, if one is configured.
    pub fn base_url(&self, source: &str) -> Option<&str> {
        self.sources.get(source).map(String::as_str)
    }

    /// Returns the endpoint path for `operation`, if one is configured.
    pub fn operation_path(&self, operation: &str) -> Option<&str> {
        self.operations.get(operation).map(String::as_str)
    }

    /// Known operation names, sorted.
    pub fn operations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value '{raw}'"))
        })
        .transpose()
}
