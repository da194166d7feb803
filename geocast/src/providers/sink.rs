//! Filesystem artifact sink.

use super::ArtifactSink;
use crate::errors::ProviderError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Writes artifacts under a root directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Creates a sink rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn write(&self, relative_path: &str, content: &[u8]) -> Result<PathBuf, ProviderError> {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "artifact written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path());

        let path = sink
            .write("sources/source_1.txt", "본문".as_bytes())
            .await
            .expect("write");

        assert!(path.exists());
        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(content, "본문");
    }

    #[tokio::test]
    async fn test_write_overwrites_existing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path());

        sink.write("a.txt", b"first").await.expect("write");
        sink.write("a.txt", b"second").await.expect("write");

        let content = std::fs::read(dir.path().join("a.txt")).expect("read");
        assert_eq!(content, b"second");
    }
}
