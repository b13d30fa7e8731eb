//! File-backed key-value store.
//!
//! Each key maps to `{dir}/{percent-encoded key}.json`. Writes land in a
//! sibling temporary file which is then renamed over the target, so a reader
//! sees either the previous value or the new one, never a partial write.
//! Temporary names carry the process id and a per-process counter, so
//! concurrent writers (including separate `rs-cart` processes) never share
//! one; the last rename wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::instrument;

use super::{KeyValueStore, StorageError};

/// Key-value store persisted under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the store writes to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique sibling of `path` to stage a write in.
fn tmp_path(path: &Path) -> PathBuf {
    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("json.{}.{seq}.tmp", std::process::id()))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display(), bytes = value.len()))]
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(&self.dir))?;

        let path = self.path_for(key);
        let tmp = tmp_path(&path);

        tokio::fs::write(&tmp, value).await.map_err(io_error(&tmp))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(&path)(e));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_encodes_key() {
        let store = FileStore::new("/tmp/rocketshoes");
        assert_eq!(
            store.path_for("@RocketShoes:cart"),
            PathBuf::from("/tmp/rocketshoes/%40RocketShoes%3Acart.json")
        );
        assert_eq!(
            store.path_for("../escape"),
            PathBuf::from("/tmp/rocketshoes/..%2Fescape.json")
        );
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.read("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        store.write("@RocketShoes:cart", "[]").await.unwrap();
        store.write("@RocketShoes:cart", "[{}]").await.unwrap();

        assert_eq!(
            store.read("@RocketShoes:cart").await.unwrap().as_deref(),
            Some("[{}]")
        );

        let leftovers: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_tmp_paths_are_unique() {
        let path = PathBuf::from("/tmp/rocketshoes/cart.json");
        let first = tmp_path(&path);
        let second = tmp_path(&path);
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<String> = (0..16).map(|i| format!("[{i}]")).collect();

        let tasks: Vec<_> = values
            .iter()
            .cloned()
            .map(|value| {
                // Separate stores, as two processes would have.
                let store = FileStore::new(dir.path());
                tokio::spawn(async move { store.write("@RocketShoes:cart", &value).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let store = FileStore::new(dir.path());
        let stored = store.read("@RocketShoes:cart").await.unwrap().unwrap();
        assert!(values.contains(&stored));

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_write_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::new(&blocker);
        let err = store.write("cart", "[]").await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
