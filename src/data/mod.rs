//! Image metadata served by Bing's image archive
//!
//! This module contains the image record type and the client used to fetch
//! records and image bytes from the remote endpoint.

pub mod bing;

pub use bing::{BingClient, PhotoSource, RemoteDataError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single "image of the day" entry
///
/// Field names follow the API payload. Fields this crate does not interpret
/// (title, copyright, hash, ...) are carried along in `extra` and written back
/// out on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// First day the image is shown (YYYYMMDD)
    #[serde(rename = "startdate")]
    pub start_date: String,
    /// Day the image is keyed on in the cache (YYYYMMDD)
    #[serde(rename = "enddate")]
    pub end_date: String,
    /// Absolute image URL with the requested resolution
    pub url: String,
    /// Passthrough metadata
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageRecord {
    /// Returns a passthrough string field such as `title` or `copyright`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }
}
