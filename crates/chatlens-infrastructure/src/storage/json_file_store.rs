//! Directory-backed key-value store with atomic writes.
//!
//! Each key is stored in its own `<key>.json` file under the store directory.

use chatlens_core::chat::KeyValueStore;
use chatlens_core::error::{ChatError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// A key-value store that keeps one JSON file per key.
///
/// Provides:
/// - **Atomicity**: Each `set` writes a tmp file and renames it over the old one
/// - **Isolation**: An exclusive lock file serializes writers of the same key
/// - **Durability**: Explicit fsync before rename
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `base_dir`. The directory is created lazily
    /// on the first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Maps a store key to its file.
    ///
    /// A leading `@` is dropped and any character outside `[A-Za-z0-9_-]`
    /// becomes `_`, so `@chat_history` lives in `chat_history.json`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let stem: String = key
            .trim_start_matches('@')
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("{stem}.json"))
    }

    fn read_file(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_file(path: &Path, value: &str) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| ChatError::io("Store path has no parent directory"))?;
        fs::create_dir_all(parent)?;

        let _lock = FileLock::acquire(path)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| ChatError::io("Store path has no file name"))?;
        let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(value.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        // Atomic rename
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || Self::read_file(&path))
            .await
            .map_err(|e| ChatError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let value = value.to_string();
        tracing::debug!(path = %path.display(), bytes = value.len(), "Writing store file");

        tokio::task::spawn_blocking(move || Self::write_file(&path, &value))
            .await
            .map_err(|e| ChatError::internal(format!("Failed to join task: {}", e)))?
    }
}

/// A file lock guard that automatically releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock next to `path`.
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| ChatError::data_access(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_key() {
        let store = JsonFileStore::new("/store");
        assert_eq!(store.path_for("@chat_history"), Path::new("/store/chat_history.json"));
        assert_eq!(store.path_for("@favorites"), Path::new("/store/favorites.json"));
        assert_eq!(store.path_for("a/../b"), Path::new("/store/a____b.json"));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("store"));
        assert_eq!(store.get("@favorites").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("store"));

        store.set("@favorites", "[1,2]").await.unwrap();
        store.set("@favorites", "[3]").await.unwrap();

        assert_eq!(store.get("@favorites").await.unwrap().as_deref(), Some("[3]"));
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_no_temp_or_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        store.set("@chat_history", "[]").await.unwrap();

        assert!(temp_dir.path().join("chat_history.json").exists());
        assert!(!temp_dir.path().join(".chat_history.json.tmp").exists());
        assert!(!temp_dir.path().join("chat_history.lock").exists());
    }
}
