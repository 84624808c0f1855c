use async_trait::async_trait;
use bytes::Bytes;

/// Transport for a single feed request.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs one GET against `url` and returns the complete response body.
    async fn get(&self, url: &str) -> anyhow::Result<Bytes>;
}
