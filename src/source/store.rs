use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use crate::deals::Deal;
use crate::source::DealSource;
use crate::store::DealStore;

#[derive(Debug, Clone)]
pub struct StoreSource {
    db_path: PathBuf,
}

impl StoreSource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

#[async_trait]
impl DealSource for StoreSource {
    fn name(&self) -> &str {
        "store"
    }

    async fn fetch_deals(&self) -> Result<Vec<Deal>> {
        let store = DealStore::open(&self.db_path)?;
        store.load_deals()
    }
}
