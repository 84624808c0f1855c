//! BusTime feed client: endpoint construction and fetch with bounded retry.

mod basic;
mod client;
mod retry;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use retry::{RetryOutcome, RetryPolicy};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::FeedError;

/// A raw feed document and when it was read.
#[derive(Debug, Clone)]
pub struct FeedResponse {
    pub body: Bytes,
    /// Wall-clock time at which the body finished downloading.
    pub timestamp: DateTime<Utc>,
    /// Attempts it took, including the successful one.
    pub attempts: u32,
}

/// Builds `<base><operation-path>?k1=v1&k2=v2` from the configured tables.
///
/// Parameters keep their order and are not URL-encoded; the feed expects them
/// exactly as given.
pub fn build_url<K, V>(
    config: &FeedConfig,
    source: &str,
    operation: &str,
    params: &[(K, V)],
) -> Result<String, FeedError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let base = config
        .base_url(source)
        .ok_or_else(|| FeedError::UnknownSource(source.to_string()))?;
    let path = config
        .operation_path(operation)
        .ok_or_else(|| FeedError::UnknownOperation(operation.to_string()))?;

    let mut url = format!("{base}{path}");
    if !params.is_empty() {
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
            .collect();
        url.push('?');
        url.push_str(&query.join("&"));
    }
    Ok(url)
}

/// Fetches one feed document, retrying transport failures per `config.retry`.
///
/// Connection errors, non-success statuses and empty bodies all count as failed
/// attempts. Once the attempts are spent the call fails with
/// [`FeedError::Unavailable`]; partial data is never returned.
#[tracing::instrument(skip(client, config, params))]
pub async fn fetch<C, K, V>(
    client: &C,
    config: &FeedConfig,
    source: &str,
    operation: &str,
    params: &[(K, V)],
) -> Result<FeedResponse, FeedError>
where
    C: HttpClient,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let url = build_url(config, source, operation, params)?;
    let url_ref = url.as_str();
    let max_attempts = config.retry.max_attempts;
    let delay_secs = config.retry.delay.as_secs_f64();

    let outcome = config
        .retry
        .run(|attempt| async move {
            debug!(url = url_ref, attempt, "Requesting feed");
            let result = match client.get(url_ref).await {
                Ok(body) if body.is_empty() => Err(anyhow::anyhow!("empty response body")),
                Ok(body) => Ok((body, Utc::now())),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!(
                    attempt,
                    max_attempts,
                    delay_secs,
                    error = %e,
                    "Feed request failed"
                );
            }
            result
        })
        .await;

    match outcome {
        RetryOutcome::Success {
            value: (body, timestamp),
            attempts,
        } => {
            debug!(bytes = body.len(), attempts, "Feed fetched");
            Ok(FeedResponse {
                body,
                timestamp,
                attempts,
            })
        }
        RetryOutcome::Exhausted {
            attempts,
            last_error,
        } => Err(FeedError::Unavailable {
            url,
            attempts,
            last_error: format!("{last_error:#}"),
        }),
    }
}

/// Like [`fetch`], then writes the raw body under `raw_dir` as
/// `<%Y%m%d.%H%M%S>.<source>.xml`.
pub async fn fetch_and_archive<C, K, V>(
    client: &C,
    config: &FeedConfig,
    source: &str,
    operation: &str,
    params: &[(K, V)],
    raw_dir: &std::path::Path,
) -> Result<FeedResponse, FeedError>
where
    C: HttpClient,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let response = fetch(client, config, source, operation, params).await?;
    crate::output::write_raw_snapshot(raw_dir, source, &response)?;
    Ok(response)
}
