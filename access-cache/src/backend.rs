//! Storage backends for the cache store.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use access_core::error::Result;
use access_core::CacheBackend;

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory backend. Contents live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// True if `key` has a stored value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE
// ═══════════════════════════════════════════════════════════════════════════════

/// One JSON file per key under a directory.
///
/// Writes go to `<key>.tmp` first and are renamed into place, so a crash
/// mid-write never leaves a truncated entry behind.
#[derive(Clone, Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Uses `dir` for storage. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[async_trait]
impl CacheBackend for FileBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &path).await?;

        debug!(path = ?path, "Cache entry written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read("k").await.unwrap(), None);

        backend.write("k", "v1").await.unwrap();
        backend.write("k", "v2").await.unwrap();
        assert_eq!(backend.read("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(backend.len(), 1);

        backend.remove("k").await.unwrap();
        assert!(backend.is_empty());
        backend.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_missing_is_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("cache"));
        assert_eq!(backend.read("blocklist").await.unwrap(), None);
        backend.remove("blocklist").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_write_and_read() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("cache"));

        backend.write("sheet-csv", r#"{"timestamp":1,"data":"x"}"#).await.unwrap();
        let path = backend.path_for("sheet-csv");
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let read = backend.read("sheet-csv").await.unwrap();
        assert_eq!(read.as_deref(), Some(r#"{"timestamp":1,"data":"x"}"#));
    }

    #[tokio::test]
    async fn test_file_remove() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.write("k", "v").await.unwrap();
        backend.remove("k").await.unwrap();
        assert_eq!(backend.read("k").await.unwrap(), None);
    }

    #[test]
    fn test_path_sanitizes_key() {
        let backend = FileBackend::new("/tmp/cache");
        let path = backend.path_for("../etc/passwd");
        assert_eq!(path, PathBuf::from("/tmp/cache/___etc_passwd.json"));
    }
}
