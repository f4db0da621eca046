//! Cache reconciliation
//!
//! Decides, for a configuration and the current contents of a cache
//! directory, which cached images stay, which are stale, and which dates must
//! be downloaded. Planning is pure; [`reconcile`] gathers its inputs from an
//! [`ImageStore`].

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::store::{CacheError, ImageStore};
use crate::config::Configuration;

/// Date format used for cache file names and API dates
pub const DATE_FORMAT: &str = "%Y%m%d";

/// What a cache run has to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Cached images that are still valid
    pub files_to_keep: Vec<PathBuf>,
    /// Cached images that are stale
    pub files_to_delete: Vec<PathBuf>,
    /// Date keys still missing, most recent first
    pub dates_to_fetch: Vec<String>,
    /// Whether the run marker differs from the current configuration
    pub config_changed: bool,
}

/// Computes the dates the API window covers for a configuration
///
/// The window starts at `today - date_offset` and extends `count` days into
/// the past, mirroring the `idx`/`n` parameters of the archive request.
/// Days outside the representable date range are left out, so an offset far
/// enough in the past yields an empty window.
pub fn target_dates(config: &Configuration, today: NaiveDate) -> Vec<String> {
    let start = Duration::try_days(config.date_offset)
        .and_then(|offset| today.checked_sub_signed(offset));

    std::iter::successors(start, |date| date.pred_opt())
        .take(usize::from(config.count))
        .map(|date| date.format(DATE_FORMAT).to_string())
        .collect()
}

/// Plans a cache run from already gathered inputs
///
/// # Arguments
/// * `config` - The current configuration
/// * `previous` - The configuration recorded by the run marker, if any
/// * `today` - The local date the window is computed from
/// * `images` - Paths of the cached image files, in any order
pub fn plan(
    config: &Configuration,
    previous: Option<&Configuration>,
    today: NaiveDate,
    images: impl IntoIterator<Item = PathBuf>,
) -> ReconcilePlan {
    let targets = target_dates(config, today);
    let config_changed = previous != Some(config);

    let mut missing: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let mut files_to_keep = Vec::new();
    let mut files_to_delete = Vec::new();

    for path in images {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

        if !config_changed && missing.remove(stem) {
            files_to_keep.push(path);
        } else {
            files_to_delete.push(path);
        }
    }

    files_to_keep.sort();
    files_to_delete.sort();

    let dates_to_fetch = targets
        .iter()
        .filter(|date| missing.contains(date.as_str()))
        .cloned()
        .collect();

    ReconcilePlan {
        files_to_keep,
        files_to_delete,
        dates_to_fetch,
        config_changed,
    }
}

/// Reads the run marker and directory listing and plans a cache run
pub fn reconcile(
    config: &Configuration,
    store: &ImageStore,
    today: NaiveDate,
) -> Result<ReconcilePlan, CacheError> {
    let previous = store.read_run_marker();
    let images = store.list_images()?;
    let plan = plan(config, previous.as_ref(), today, images);

    debug!(
        keep = plan.files_to_keep.len(),
        delete = plan.files_to_delete.len(),
        fetch = ?plan.dates_to_fetch,
        config_changed = plan.config_changed,
        "reconciled cache directory"
    );

    Ok(plan)
}
