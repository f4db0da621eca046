//! Command-line interface parsing for the Bing photo CLI
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! raw options for [`Configuration::normalize`](crate::config::Configuration::normalize).
//! Values are passed through unvalidated so that normalization can clamp them.

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;
use serde::Serialize;
use thiserror::Error;

use crate::config::{Configuration, RawOptions};
use crate::data::ImageRecord;
use crate::photo::{BingPhoto, CacheReport};

/// Error types for the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// `--cache` was given without a directory and no default could be determined
    #[error("Could not determine a default cache directory; pass one to --cache")]
    NoCacheDir,

    /// The whole fetch took longer than `--timeout`
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Failed to render JSON output
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Bing photo CLI - fetch and cache Bing's image of the day
#[derive(Parser, Debug)]
#[command(name = "bingphoto")]
#[command(about = "Fetch and cache Bing's image of the day")]
#[command(version)]
pub struct Cli {
    /// Day offset: -1 = tomorrow, 0 = today, 1 = yesterday, n = n days ago
    #[arg(short = 'd', long = "date", value_name = "OFFSET", allow_negative_numbers = true)]
    pub date: Option<i64>,

    /// Number of images to fetch (1 to 8)
    #[arg(short = 'n', long, value_name = "N", allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// Market/locale such as en-US (defaults to the system locale)
    #[arg(short, long)]
    pub locale: Option<String>,

    /// Image quality: 1920x1080 (high) or 1366x768 (low)
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Image orientation: landscape or portrait
    #[arg(short, long)]
    pub orientation: Option<String>,

    /// Download images into a cache directory
    ///
    /// Without a value the platform cache directory is used
    /// (e.g. ~/.cache/bingphoto on Linux).
    #[arg(long, value_name = "DIR")]
    pub cache: Option<Option<PathBuf>>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Print images and cache results as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Converts parsed arguments into raw options
    ///
    /// # Returns
    /// * `Ok(RawOptions)` with the cache directory resolved
    /// * `Err(CliError::NoCacheDir)` if `--cache` has no value and no default exists
    pub fn raw_options(&self) -> Result<RawOptions, CliError> {
        let cache_dir = match &self.cache {
            None => None,
            Some(Some(dir)) => Some(dir.clone()),
            Some(None) => Some(default_cache_dir().ok_or(CliError::NoCacheDir)?),
        };

        Ok(RawOptions {
            date_offset: self.date,
            count: self.count,
            locale: self.locale.clone(),
            quality: self.quality.clone(),
            orientation: self.orientation.clone(),
            cache_dir,
        })
    }
}

/// Returns the XDG-compliant cache directory for downloaded images
pub fn default_cache_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "bingphoto")?;
    Some(project_dirs.cache_dir().to_path_buf())
}

/// JSON document printed with `--json`
#[derive(Debug, Serialize)]
struct Output<'a> {
    config: &'a Configuration,
    images: &'a [ImageRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<&'a CacheReport>,
}

/// Renders the result of a fetch for printing
///
/// Plain output lists one image URL per line followed by the cached file paths.
pub fn render(photo: &BingPhoto, json: bool) -> Result<String, CliError> {
    let images = photo.get_images(usize::from(photo.get_args().count));

    if json {
        let output = Output {
            config: photo.get_args(),
            images,
            cache: photo.cache_report(),
        };
        return Ok(serde_json::to_string_pretty(&output)?);
    }

    let lines: Vec<String> = images
        .iter()
        .map(|image| image.url.clone())
        .chain(
            photo
                .get_cached_images()
                .iter()
                .map(|path| path.display().to_string()),
        )
        .collect();

    Ok(lines.join("\n"))
}
