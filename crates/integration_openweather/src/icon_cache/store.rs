//! Filesystem tier of the icon cache
//!
//! One `<iconId>.png` file per icon, holding the raw bytes as fetched. There is
//! no index or metadata sidecar; the directory listing is the index.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use super::validate_icon_id;
use crate::error::WeatherError;

const ICON_EXTENSION: &str = "png";

/// Directory-backed icon store
#[derive(Debug, Clone)]
pub struct IconStore {
    dir: PathBuf,
}

impl IconStore {
    /// Create a store rooted at `dir`
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the cache file for an icon identifier
    ///
    /// # Errors
    ///
    /// Returns `WeatherError::InvalidUrl` for identifiers that are not a single
    /// safe path segment, so no path can resolve outside the cache directory.
    pub fn path_for(&self, icon_id: &str) -> Result<PathBuf, WeatherError> {
        validate_icon_id(icon_id)?;
        Ok(self.dir.join(format!("{icon_id}.{ICON_EXTENSION}")))
    }

    /// Whether a cache file exists for the identifier
    pub async fn contains(&self, icon_id: &str) -> bool {
        let Ok(path) = self.path_for(icon_id) else {
            return false;
        };
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Read the raw bytes of a cached icon
    ///
    /// Absent and unreadable files are both reported as `CacheMiss`; invalid
    /// identifiers as `InvalidUrl`.
    pub async fn load(&self, icon_id: &str) -> Result<Bytes, WeatherError> {
        let path = self.path_for(icon_id)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| WeatherError::CacheMiss(format!("{}: {e}", path.display())))?;
        Ok(Bytes::from(data))
    }

    /// Write icon bytes, replacing any existing file
    pub async fn save(&self, icon_id: &str, data: &[u8]) -> Result<PathBuf, WeatherError> {
        let path = self.path_for(icon_id)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            WeatherError::Persist(format!("create {}: {e}", self.dir.display()))
        })?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| WeatherError::Persist(format!("write {}: {e}", path.display())))?;

        debug!(path = %path.display(), bytes = data.len(), "Wrote icon file");
        Ok(path)
    }

    /// Identifiers of all cached icons, sorted
    ///
    /// A cache directory that does not exist yet is empty.
    pub async fn list(&self) -> Result<Vec<String>, WeatherError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(WeatherError::Storage(format!(
                    "{}: {e}",
                    self.dir.display()
                )));
            },
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WeatherError::Storage(format!("{}: {e}", self.dir.display())))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ICON_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn path_for_uses_png_extension() {
        let store = IconStore::new("/cache");
        assert_eq!(
            store.path_for("10d").expect("valid id"),
            PathBuf::from("/cache/10d.png")
        );
    }

    #[test]
    fn path_for_rejects_traversal() {
        let store = IconStore::new("/cache");
        for id in ["../x", "a/b", "..", ""] {
            assert!(
                matches!(store.path_for(id), Err(WeatherError::InvalidUrl(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn save_refuses_to_escape_cache_directory() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IconStore::new(temp_dir.path().join("icons"));

        let err = store.save("../escape", b"x").await.expect_err("should reject");
        assert!(matches!(err, WeatherError::InvalidUrl(_)));
        assert!(!temp_dir.path().join("escape.png").exists());
        assert!(!temp_dir.path().join("icons").exists());
        assert!(!store.contains("../escape").await);
        assert!(store.load("../escape").await.is_err());
    }

    #[tokio::test]
    async fn load_missing_is_cache_miss() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IconStore::new(temp_dir.path());

        let err = store.load("01d").await.expect_err("should miss");
        assert!(matches!(err, WeatherError::CacheMiss(_)));
        assert!(!store.contains("01d").await);
    }

    #[tokio::test]
    async fn save_creates_directory_and_round_trips_bytes() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IconStore::new(temp_dir.path().join("nested").join("icons"));

        let path = store.save("02n", b"icon-bytes").await.expect("should save");
        assert_eq!(path, store.path_for("02n").expect("valid id"));
        assert!(store.contains("02n").await);

        let loaded = store.load("02n").await.expect("should load");
        assert_eq!(&loaded[..], b"icon-bytes");
    }

    #[tokio::test]
    async fn save_overwrites_existing_file() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IconStore::new(temp_dir.path());

        store.save("03d", b"first").await.expect("should save");
        store.save("03d", b"second").await.expect("should save");

        let loaded = store.load("03d").await.expect("should load");
        assert_eq!(&loaded[..], b"second");
    }

    #[tokio::test]
    async fn save_into_unusable_directory_is_persist_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").expect("write blocker");

        let store = IconStore::new(&blocker);
        let err = store.save("04d", b"x").await.expect_err("should fail");
        assert!(matches!(err, WeatherError::Persist(_)));
    }

    #[tokio::test]
    async fn list_returns_png_stems_only() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IconStore::new(temp_dir.path());

        store.save("10n", b"a").await.expect("should save");
        store.save("01d", b"b").await.expect("should save");
        std::fs::write(temp_dir.path().join("notes.txt"), b"ignored").expect("write");

        let ids = store.list().await.expect("should list");
        assert_eq!(ids, vec!["01d".to_string(), "10n".to_string()]);
    }

    #[tokio::test]
    async fn list_of_unreadable_directory_is_storage_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").expect("write blocker");

        let store = IconStore::new(&blocker);
        let err = store.list().await.expect_err("should fail");
        assert!(matches!(err, WeatherError::Storage(_)));
    }

    #[tokio::test]
    async fn list_of_missing_directory_is_empty() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IconStore::new(temp_dir.path().join("absent"));

        assert!(store.list().await.expect("should list").is_empty());
    }
}
