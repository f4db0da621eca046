//! Bing image of the day, fetched eagerly on construction
//!
//! [`BingPhoto`] ties the pieces together: it fetches the metadata for a
//! configuration and, when a cache directory is configured, brings that
//! directory in line with the configuration.
//!
//! A cache run goes through these steps in order, and any fatal error stops
//! it where it is:
//!
//! 1. validate (or create) the cache directory; failing here touches nothing
//! 2. reconcile the directory against the run marker
//! 3. delete stale images
//! 4. fetch metadata
//! 5. download and write missing images
//! 6. write the run marker if the configuration changed
//!
//! Deletes always precede writes, so a date that is both stale and targeted
//! is never served with bytes from the old configuration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{reconcile, CacheError, FileFailure, ImageStore, ReconcilePlan, RUNFILE_NAME};
use crate::config::Configuration;
use crate::data::{BingClient, ImageRecord, PhotoSource, RemoteDataError};

/// Fatal errors of a fetch
#[derive(Debug, Error)]
pub enum BingPhotoError {
    /// Metadata could not be retrieved or parsed
    #[error(transparent)]
    RemoteData(#[from] RemoteDataError),

    /// The cache directory is unusable
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Outcome of a cache run
///
/// Per-file failures do not abort a run; they are collected here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheReport {
    /// Absolute paths of the images now in the cache for this configuration
    pub cached: Vec<PathBuf>,
    /// Stale images that were removed
    pub deleted: Vec<PathBuf>,
    /// Stale images that could not be removed
    pub delete_failures: Vec<FileFailure>,
    /// Images (or the run marker) that could not be downloaded or written
    pub write_failures: Vec<FileFailure>,
}

/// Image(s) of the day for one configuration
#[derive(Debug, Clone)]
pub struct BingPhoto {
    args: Configuration,
    images: Vec<ImageRecord>,
    cache: Option<CacheReport>,
}

impl BingPhoto {
    /// Fetches images from Bing, caching them if a cache directory is configured
    pub async fn new(config: Configuration) -> Result<Self, BingPhotoError> {
        Self::with_source(config, &BingClient::new()).await
    }

    /// Fetches images from a custom source
    pub async fn with_source<S>(config: Configuration, source: &S) -> Result<Self, BingPhotoError>
    where
        S: PhotoSource + ?Sized,
    {
        let today = Local::now().date_naive();
        Self::with_source_at(config, source, today).await
    }

    /// Fetches images from a custom source, computing the cache window from `today`
    pub async fn with_source_at<S>(
        config: Configuration,
        source: &S,
        today: NaiveDate,
    ) -> Result<Self, BingPhotoError>
    where
        S: PhotoSource + ?Sized,
    {
        let Some(cache_dir) = config.cache_dir.clone() else {
            let images = source.fetch_metadata(&config).await?;
            return Ok(Self {
                args: config,
                images,
                cache: None,
            });
        };

        let store = ImageStore::open(cache_dir)?;
        let plan = reconcile(&config, &store, today)?;

        let mut report = CacheReport::default();
        delete_stale(&store, &plan, &mut report);

        let images = source.fetch_metadata(&config).await?;

        report
            .cached
            .extend(plan.files_to_keep.iter().map(|path| absolute(path)));
        write_missing(&store, source, &plan, &images, &mut report).await;

        if plan.config_changed {
            if let Err(e) = store.write_run_marker(&config) {
                warn!(error = %e, "failed to write run marker");
                report
                    .write_failures
                    .push(FileFailure::new(store.cache_dir().join(RUNFILE_NAME), e));
            }
        }

        Ok(Self {
            args: config,
            images,
            cache: Some(report),
        })
    }

    /// Returns the first fetched image, if any
    pub fn get_image(&self) -> Option<&ImageRecord> {
        self.images.first()
    }

    /// Returns up to `n` fetched images, most recent first
    ///
    /// The API may return fewer images than requested, so the result can be
    /// shorter than `n`.
    pub fn get_images(&self, n: usize) -> &[ImageRecord] {
        &self.images[..n.min(self.images.len())]
    }

    /// Returns the absolute paths of the locally cached images
    ///
    /// Empty when no cache directory is configured.
    pub fn get_cached_images(&self) -> &[PathBuf] {
        self.cache
            .as_ref()
            .map(|report| report.cached.as_slice())
            .unwrap_or_default()
    }

    /// Returns the effective configuration
    pub fn get_args(&self) -> &Configuration {
        &self.args
    }

    /// Returns the full outcome of the cache run, if one happened
    pub fn cache_report(&self) -> Option<&CacheReport> {
        self.cache.as_ref()
    }
}

fn delete_stale(store: &ImageStore, plan: &ReconcilePlan, report: &mut CacheReport) {
    for path in &plan.files_to_delete {
        match store.delete_cached_file(path) {
            Ok(()) => report.deleted.push(path.clone()),
            Err(failure) => report.delete_failures.push(failure),
        }
    }
}

async fn write_missing<S>(
    store: &ImageStore,
    source: &S,
    plan: &ReconcilePlan,
    images: &[ImageRecord],
    report: &mut CacheReport,
) where
    S: PhotoSource + ?Sized,
{
    let mut pending: HashSet<&str> = plan.dates_to_fetch.iter().map(String::as_str).collect();

    for image in images {
        if !pending.remove(image.end_date.as_str()) {
            continue;
        }

        let path = store.image_path(&image.end_date);
        let bytes = match source.download(&image.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = %image.url, error = %e, "failed to download image");
                report.write_failures.push(FileFailure::new(&path, e));
                continue;
            }
        };

        match store.write_cached_file(&path, &bytes) {
            Ok(()) => {
                info!(path = %path.display(), "cached image");
                report.cached.push(absolute(&path));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write image");
                report.write_failures.push(FileFailure::new(&path, e));
            }
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
