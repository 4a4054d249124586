//! Local filesystem storage for uploaded documents.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;

use super::BaseFileStorage;

/// Stores files under a root directory, keyed by relative path.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage key to a path under the root. Keys must be relative and
    /// may not climb out of the root.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let clean = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            anyhow::bail!("invalid storage path: {}", key);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BaseFileStorage for LocalFileStorage {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::debug!(path = %path, size = bytes.len(), "stored file");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        let target = self.resolve(path)?;
        let bytes = tokio::fs::read(&target)
            .await
            .with_context(|| format!("Failed to read {}", target.display()))?;
        Ok(Bytes::from(bytes))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target)
            .await
            .with_context(|| format!("Failed to remove {}", target.display()))?;
        Ok(())
    }
}
