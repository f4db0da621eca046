//! On-disk image store
//!
//! Performs every filesystem side effect of caching: validating the cache
//! directory, listing/writing/deleting `<YYYYMMDD>.jpg` files, and reading and
//! writing the `.lastrun` run marker.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Configuration;

/// File name of the run marker
pub const RUNFILE_NAME: &str = ".lastrun";

/// Extension of cached image files
pub const IMAGE_EXTENSION: &str = "jpg";

/// Errors that make the cache unusable as a whole
#[derive(Debug, Error)]
pub enum CacheError {
    /// The directory is missing and could not be created, or cannot be read
    #[error("Given cache directory {} does not exist or cannot be created: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A non-fatal failure on a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// The file that could not be written or deleted
    pub path: PathBuf,
    /// Human-readable cause
    pub reason: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Reads and writes cached images inside one directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    /// Directory where images and the run marker are stored
    cache_dir: PathBuf,
}

impl ImageStore {
    /// Opens a store, creating the directory if needed
    ///
    /// # Returns
    /// * `Ok(ImageStore)` if the directory exists or was created
    /// * `Err(CacheError::Unavailable)` otherwise; nothing is written in that case
    pub fn open(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();

        if !cache_dir.is_dir() {
            fs::create_dir_all(&cache_dir).map_err(|source| CacheError::Unavailable {
                path: cache_dir.clone(),
                source,
            })?;
            debug!(path = %cache_dir.display(), "created cache directory");
        }

        Ok(Self { cache_dir })
    }

    /// Returns the directory this store manages
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of the cached image for a date key
    pub fn image_path(&self, date: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", date, IMAGE_EXTENSION))
    }

    fn runfile_path(&self) -> PathBuf {
        self.cache_dir.join(RUNFILE_NAME)
    }

    /// Lists all cached image files (unsorted)
    pub fn list_images(&self) -> Result<Vec<PathBuf>, CacheError> {
        let unavailable = |source: io::Error| CacheError::Unavailable {
            path: self.cache_dir.clone(),
            source,
        };

        let mut images = Vec::new();
        for entry in fs::read_dir(&self.cache_dir).map_err(unavailable)? {
            let path = entry.map_err(unavailable)?.path();
            let is_image = path.extension().and_then(|e| e.to_str()) == Some(IMAGE_EXTENSION);
            if is_image && path.is_file() {
                images.push(path);
            }
        }

        Ok(images)
    }

    /// Removes a cached file
    ///
    /// Best effort: the failure is logged and handed back for reporting, but
    /// never aborts a cache run.
    pub fn delete_cached_file(&self, path: &Path) -> Result<(), FileFailure> {
        fs::remove_file(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to delete cached image");
            FileFailure::new(path, e)
        })
    }

    /// Writes image bytes to the given path
    pub fn write_cached_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }

    /// Reads the configuration recorded by the previous run
    ///
    /// Returns `None` if there is no marker. A marker that cannot be parsed is
    /// removed and also reported as `None`.
    pub fn read_run_marker(&self) -> Option<Configuration> {
        let path = self.runfile_path();
        let content = fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable run marker");
                let _ = self.delete_cached_file(&path);
                None
            }
        }
    }

    /// Records the configuration of this run
    pub fn write_run_marker(&self, config: &Configuration) -> io::Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(self.runfile_path(), json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawOptions;
    use tempfile::TempDir;

    fn create_test_store() -> (ImageStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = ImageStore::open(temp_dir.path()).expect("Store should open");
        (store, temp_dir)
    }

    fn test_config(dir: &Path) -> Configuration {
        Configuration::normalize(
            RawOptions {
                count: Some(3),
                cache_dir: Some(dir.to_path_buf()),
                ..Default::default()
            },
            "en-US",
        )
    }

    #[test]
    fn test_open_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("cache");

        let store = ImageStore::open(&nested).expect("Should create nested directory");

        assert!(nested.is_dir());
        assert_eq!(store.cache_dir(), nested.as_path());
    }

    #[test]
    fn test_open_fails_below_a_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        let result = ImageStore::open(file.join("cache"));

        assert!(matches!(result, Err(CacheError::Unavailable { .. })));
        assert!(!file.join("cache").exists());
    }

    #[test]
    fn test_open_fails_on_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.jpg");
        fs::write(&file, b"x").unwrap();

        let err = ImageStore::open(&file).unwrap_err();
        assert!(err.to_string().contains("does not exist or cannot be created"));
    }

    #[test]
    fn test_image_path_uses_date_and_extension() {
        let (store, temp_dir) = create_test_store();
        assert_eq!(store.image_path("20261018"), temp_dir.path().join("20261018.jpg"));
    }

    #[test]
    fn test_list_images_only_returns_jpg_files() {
        let (store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join("20261018.jpg"), b"a").unwrap();
        fs::write(temp_dir.path().join("20261017.jpg"), b"b").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"c").unwrap();
        fs::write(temp_dir.path().join(RUNFILE_NAME), b"{}").unwrap();
        fs::create_dir(temp_dir.path().join("folder.jpg")).unwrap();

        let mut images = store.list_images().unwrap();
        images.sort();

        assert_eq!(
            images,
            vec![
                temp_dir.path().join("20261017.jpg"),
                temp_dir.path().join("20261018.jpg"),
            ]
        );
    }

    #[test]
    fn test_write_and_delete_cached_file() {
        let (store, _temp_dir) = create_test_store();
        let path = store.image_path("20261018");

        store.write_cached_file(&path, b"jpeg bytes").expect("Write should succeed");
        assert_eq!(fs::read(&path).unwrap(), b"jpeg bytes");

        store.delete_cached_file(&path).expect("Delete should succeed");
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_missing_file_reports_failure() {
        let (store, _temp_dir) = create_test_store();
        let path = store.image_path("19700101");

        let failure = store.delete_cached_file(&path).unwrap_err();

        assert_eq!(failure.path, path);
        assert!(!failure.reason.is_empty());
    }

    #[test]
    fn test_read_run_marker_returns_none_when_absent() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.read_run_marker().is_none());
    }

    #[test]
    fn test_run_marker_survives_roundtrip() {
        let (store, temp_dir) = create_test_store();
        let config = test_config(temp_dir.path());

        store.write_run_marker(&config).expect("Write should succeed");

        assert_eq!(store.read_run_marker(), Some(config));
    }

    #[test]
    fn test_corrupt_run_marker_is_removed() {
        let (store, temp_dir) = create_test_store();
        let marker = temp_dir.path().join(RUNFILE_NAME);
        fs::write(&marker, "{ not json").unwrap();

        assert!(store.read_run_marker().is_none());
        assert!(!marker.exists(), "Corrupt marker should be deleted");
    }
}
