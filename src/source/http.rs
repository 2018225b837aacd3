use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use tracing::info;

use crate::deals::Deal;
use crate::source::{DealPayload, DealSource};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("deal-hunter/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// A remote deal feed serving JSON.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

pub async fn fetch_text(url: &str) -> Result<String> {
    let response = HTTP_CLIENT
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed GET request: {url}"))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed reading response body: {url}"))?;
    if !status.is_success() {
        let preview: String = body.chars().take(180).collect();
        return Err(anyhow!("GET {url} returned {status}: {preview}"));
    }
    Ok(body)
}

#[async_trait]
impl DealSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_deals(&self) -> Result<Vec<Deal>> {
        let body = fetch_text(&self.url).await?;
        let payload: DealPayload = serde_json::from_str(&body)
            .with_context(|| format!("invalid deal feed JSON: {}", self.url))?;
        let deals = payload.into_deals();
        info!("fetched {} deals from {}", deals.len(), self.url);
        Ok(deals)
    }
}
