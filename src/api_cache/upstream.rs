//! Upstream Client
//!
//! JSON GETs against the studio backend, used as the fetch function behind
//! the read-through cache.

use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building upstream HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL for `/api/{namespace}/{signature}`.
    pub fn url_for(&self, namespace: &str, signature: &str) -> String {
        if signature.is_empty() {
            format!("{}/api/{}", self.base_url, namespace)
        } else if signature.starts_with('?') {
            format!("{}/api/{}{}", self.base_url, namespace, signature)
        } else {
            format!("{}/api/{}/{}", self.base_url, namespace, signature)
        }
    }

    pub async fn get_json(&self, url: String) -> anyhow::Result<Value> {
        debug!(%url, "Fetching from upstream");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?
            .error_for_status()
            .with_context(|| format!("GET {}", url))?;

        response
            .json::<Value>()
            .await
            .with_context(|| format!("decoding JSON from {}", url))
    }
}
