use crate::domain::model::CarbonEstimate;
use crate::domain::ports::CarbonEstimateCache;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// File-backed carbon estimate cache: one JSON file per cart under
/// `base_path`, mapping option id to estimate. A missing file means no
/// cached entry, not a failure.
pub struct FileEstimateCache {
    base_path: PathBuf,
}

impl FileEstimateCache {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn entry_path(&self, cart_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", cart_id))
    }
}

#[async_trait]
impl CarbonEstimateCache for FileEstimateCache {
    async fn get(&self, cart_id: &str) -> Result<Option<HashMap<String, CarbonEstimate>>> {
        let path = self.entry_path(cart_id);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("No cached estimates for cart {}", cart_id);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}
