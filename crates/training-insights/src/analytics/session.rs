use super::domain::TrainingDataset;
use chrono::{DateTime, Local};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// SHA-256 of an uploaded file, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sidebar facts about the active upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub digest: ContentDigest,
    pub total_records: usize,
    pub skipped_rows: usize,
    pub loaded_at: DateTime<Local>,
}

/// A normalized dataset together with the upload it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub digest: ContentDigest,
    pub dataset: Arc<TrainingDataset>,
    pub loaded_at: DateTime<Local>,
}

impl LoadedDataset {
    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            digest: self.digest.clone(),
            total_records: self.dataset.len(),
            skipped_rows: self.dataset.skipped_rows,
            loaded_at: self.loaded_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionLoad {
    pub loaded: LoadedDataset,
    pub cache_hit: bool,
}

/// Holds the one dataset of a single-user session, keyed by upload content.
#[derive(Debug, Default)]
pub struct SessionCache {
    current: Option<LoadedDataset>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses the cached dataset for identical bytes; otherwise runs `loader`
    /// and replaces the cache. A failed load leaves the session empty.
    pub fn load_with<F, E>(&mut self, bytes: &[u8], loader: F) -> Result<SessionLoad, E>
    where
        F: FnOnce(&[u8]) -> Result<TrainingDataset, E>,
    {
        let digest = ContentDigest::of(bytes);

        if let Some(current) = self.current.as_ref().filter(|current| current.digest == digest) {
            debug!(%digest, "upload unchanged; reusing normalized dataset");
            return Ok(SessionLoad {
                loaded: current.clone(),
                cache_hit: true,
            });
        }

        self.current = None;
        let dataset = loader(bytes)?;
        let loaded = LoadedDataset {
            digest,
            dataset: Arc::new(dataset),
            loaded_at: Local::now(),
        };
        info!(digest = %loaded.digest, records = loaded.dataset.len(), "session dataset replaced");
        self.current = Some(loaded.clone());

        Ok(SessionLoad {
            loaded,
            cache_hit: false,
        })
    }

    pub fn current(&self) -> Option<&LoadedDataset> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
