//! Bing image of the day
//!
//! Fetches Bing's "image of the day" metadata, rewrites image URLs to the
//! requested resolution and orientation, and optionally keeps a local cache
//! directory of the images in sync with the request configuration.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod photo;

pub use config::{Configuration, Orientation, Quality, RawOptions};
pub use data::{BingClient, ImageRecord, PhotoSource, RemoteDataError};
pub use photo::{BingPhoto, BingPhotoError, CacheReport};
