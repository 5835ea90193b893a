//! Position persistence across restarts.

use crate::positions::Position;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Storage backend for the open position book
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Saved positions; empty when nothing was ever saved.
    async fn load(&self) -> Result<Vec<Position>>;
    async fn save(&self, positions: &[Position]) -> Result<()>;
}

/// Volatile store for tests and dry runs
#[derive(Default)]
pub struct InMemoryPositionStore {
    positions: RwLock<Vec<Position>>,
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PositionStore for InMemoryPositionStore {
    async fn load(&self) -> Result<Vec<Position>> {
        Ok(self.positions.read().await.clone())
    }

    async fn save(&self, positions: &[Position]) -> Result<()> {
        *self.positions.write().await = positions.to_vec();
        Ok(())
    }
}

/// Single JSON file; a missing file reads as an empty book.
pub struct JsonPositionStore {
    path: PathBuf,
}

impl JsonPositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PositionStore for JsonPositionStore {
    async fn load(&self) -> Result<Vec<Position>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt JSON in {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        }
    }

    async fn save(&self, positions: &[Position]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(&positions.to_vec())?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
