// Learning Persistence
// Load/save seams for the weight vector and the outcome log. The in-memory
// store backs tests; the JSON store mirrors the on-disk data directory.

use crate::recorder::LearningRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use common::WeightVector;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Storage backend for learned state
#[async_trait]
pub trait LearningStore: Send + Sync {
    /// Last saved weights, or None when nothing was ever saved.
    async fn load_weights(&self) -> Result<Option<WeightVector>>;
    async fn save_weights(&self, weights: &WeightVector) -> Result<()>;
    /// Full outcome log; empty when nothing was ever saved.
    async fn load_records(&self) -> Result<Vec<LearningRecord>>;
    async fn save_records(&self, records: &[LearningRecord]) -> Result<()>;
}

/// Volatile store for tests and dry runs
#[derive(Default)]
pub struct InMemoryLearningStore {
    weights: RwLock<Option<WeightVector>>,
    records: RwLock<Vec<LearningRecord>>,
}

impl InMemoryLearningStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LearningStore for InMemoryLearningStore {
    async fn load_weights(&self) -> Result<Option<WeightVector>> {
        Ok(*self.weights.read().await)
    }

    async fn save_weights(&self, weights: &WeightVector) -> Result<()> {
        *self.weights.write().await = Some(*weights);
        Ok(())
    }

    async fn load_records(&self) -> Result<Vec<LearningRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn save_records(&self, records: &[LearningRecord]) -> Result<()> {
        *self.records.write().await = records.to_vec();
        Ok(())
    }
}

/// JSON files under a data directory: weights.json and
/// learning_records.json. Missing files read as empty state.
pub struct JsonLearningStore {
    dir: PathBuf,
}

impl JsonLearningStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn weights_path(&self) -> PathBuf {
        self.dir.join("weights.json")
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join("learning_records.json")
    }

    async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .with_context(|| format!("corrupt JSON in {}", path.display()))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[async_trait]
impl LearningStore for JsonLearningStore {
    async fn load_weights(&self) -> Result<Option<WeightVector>> {
        Self::read_json(&self.weights_path()).await
    }

    async fn save_weights(&self, weights: &WeightVector) -> Result<()> {
        self.write_json(&self.weights_path(), weights).await
    }

    async fn load_records(&self) -> Result<Vec<LearningRecord>> {
        Ok(Self::read_json(&self.records_path()).await?.unwrap_or_default())
    }

    async fn save_records(&self, records: &[LearningRecord]) -> Result<()> {
        self.write_json(&self.records_path(), &records.to_vec()).await
    }
}
