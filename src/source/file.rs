use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::deals::Deal;
use crate::source::{DealPayload, DealSource};

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DealSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_deals(&self) -> Result<Vec<Deal>> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed reading deals file: {}", self.path.display()))?;
        let payload: DealPayload = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing deals JSON: {}", self.path.display()))?;
        let deals = payload.into_deals();
        info!("loaded {} deals from {}", deals.len(), self.path.display());
        Ok(deals)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::FileSource;
    use crate::source::DealSource;

    #[tokio::test]
    async fn reads_deal_array_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"id":"d1","brand":"Nike","title":"Endorsement","valueRange":"$50K","matchScore":9}}]"#
        )
        .expect("write");
        let deals = FileSource::new(file.path())
            .fetch_deals()
            .await
            .expect("deals should load");
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].match_score, 9.0);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result = FileSource::new("/nonexistent/deals.json").fetch_deals().await;
        assert!(result.is_err());
    }
}
