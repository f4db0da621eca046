//! Bing image archive client
//!
//! Fetches "image of the day" metadata from Bing's HPImageArchive endpoint and
//! rewrites each record's URL to an absolute URL at the requested resolution.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::ImageRecord;
use crate::config::{Configuration, Quality};

/// Base URL of the Bing website, also used to make image URLs absolute
pub const BASE_URL: &str = "https://www.bing.com";

/// Path of the JSON image archive endpoint
const JSON_PATH: &str = "/HPImageArchive.aspx?format=js";

/// Errors that can occur when retrieving data from the remote endpoint
#[derive(Debug, Error)]
pub enum RemoteDataError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Unable to retrieve JSON data: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The payload parsed but has no `images` array
    #[error("Unable to retrieve JSON data: response has no images array")]
    MissingImages,
}

/// A source of image metadata and image bytes
///
/// [`BingClient`] is the production implementation; tests substitute their own.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Fetches normalized image records for the given configuration
    ///
    /// Records are ordered most recent first and hold at most
    /// `config.count` entries, but may hold fewer.
    async fn fetch_metadata(&self, config: &Configuration)
        -> Result<Vec<ImageRecord>, RemoteDataError>;

    /// Downloads the bytes behind an absolute image URL
    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteDataError>;
}

/// Top-level shape of the archive response
#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    images: Option<Vec<ImageRecord>>,
}

/// Client for Bing's image archive
#[derive(Debug, Clone)]
pub struct BingClient {
    client: Client,
    base_url: String,
}

impl Default for BingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BingClient {
    /// Create a new BingClient pointing at www.bing.com
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a new BingClient with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a new BingClient with a custom base URL (e.g. a mirror)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds the archive request URL for a configuration
    pub fn api_url(&self, config: &Configuration) -> String {
        format!(
            "{}{}&idx={}&n={}&mkt={}",
            self.base_url, JSON_PATH, config.date_offset, config.count, config.locale
        )
    }
}

#[async_trait]
impl PhotoSource for BingClient {
    async fn fetch_metadata(
        &self,
        config: &Configuration,
    ) -> Result<Vec<ImageRecord>, RemoteDataError> {
        let url = self.api_url(config);
        debug!(%url, "fetching image metadata");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let text = response.text().await?;

        parse_response(&text, config, &self.base_url)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteDataError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Parses an archive payload and normalizes every record
///
/// # Arguments
/// * `text` - The raw response body
/// * `config` - The configuration the request was made with
/// * `base_url` - Prefix for relative image URLs
///
/// # Returns
/// * `Ok(Vec<ImageRecord>)` - At most `config.count` normalized records
/// * `Err(RemoteDataError)` - If the body is not JSON or lacks `images`
pub fn parse_response(
    text: &str,
    config: &Configuration,
    base_url: &str,
) -> Result<Vec<ImageRecord>, RemoteDataError> {
    let response: ArchiveResponse = serde_json::from_str(text)?;
    let mut images = response.images.ok_or(RemoteDataError::MissingImages)?;

    images.truncate(usize::from(config.count));
    for image in &mut images {
        image.url = rewrite_url(&image.url, config, base_url);
    }

    Ok(images)
}

/// Makes an image URL absolute and substitutes the requested resolution
///
/// The archive always serves URLs at high quality in landscape, so the
/// `1920x1080` token is replaced with the configuration's effective
/// resolution (already swapped for portrait).
pub fn rewrite_url(url: &str, config: &Configuration, base_url: &str) -> String {
    let absolute = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}{}", base_url, url)
    };

    absolute.replace(
        &Quality::High.resolution().to_string(),
        &config.resolution.to_string(),
    )
}
