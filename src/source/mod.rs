pub mod file;
pub mod http;
pub mod sample;
pub mod store;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{expand_tilde, Config};
use crate::deals::Deal;
use crate::source::file::FileSource;
use crate::source::http::HttpSource;
use crate::source::sample::SampleSource;
use crate::source::store::StoreSource;

/// Anything that can hand the query engine a collection of deals.
#[async_trait]
pub trait DealSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_deals(&self) -> Result<Vec<Deal>>;
}

/// Wire shapes accepted from files and feeds: a bare array, or the export
/// envelope with a `deals` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DealPayload {
    List(Vec<Deal>),
    Envelope { deals: Vec<Deal> },
}

impl DealPayload {
    pub fn into_deals(self) -> Vec<Deal> {
        match self {
            Self::List(deals) | Self::Envelope { deals } => deals,
        }
    }
}

/// `"sample"`, `"store"`, an `http(s)://` URL, or a path to a JSON file.
pub fn resolve_source(locator: &str, config: &Config) -> Result<Box<dyn DealSource>> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("deal source is empty"));
    }
    let source: Box<dyn DealSource> = match trimmed {
        "sample" => Box::new(SampleSource::new(config.talent.clone())),
        "store" => Box::new(StoreSource::new(config.resolved_db_path())),
        url if url.starts_with("http://") || url.starts_with("https://") => {
            Box::new(HttpSource::new(url))
        }
        path => Box::new(FileSource::new(expand_tilde(path))),
    };
    Ok(source)
}
