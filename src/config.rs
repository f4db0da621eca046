//! Request configuration for fetching Bing's image of the day
//!
//! Raw, loosely-typed options (from the CLI or a library caller) are normalized
//! exactly once into a [`Configuration`]. Normalization never fails: values out
//! of range are clamped and unrecognized values fall back to defaults.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Date offset for tomorrow, the most recent day the API can serve
pub const TOMORROW: i64 = -1;

/// Date offset for today
pub const TODAY: i64 = 0;

/// Date offset for yesterday
pub const YESTERDAY: i64 = 1;

/// Bing's API returns at most 8 images per request
pub const LIMIT_N: u8 = 8;

/// Locale used when neither the caller nor the environment provides one
pub const FALLBACK_LOCALE: &str = "en-US";

/// Pre-rendered image quality offered by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "1366x768")]
    Low,
    #[default]
    #[serde(rename = "1920x1080")]
    High,
}

impl Quality {
    /// The landscape resolution of this quality
    pub fn resolution(self) -> Resolution {
        match self {
            Quality::Low => Resolution::new(1366, 768),
            Quality::High => Resolution::new(1920, 1080),
        }
    }

    /// Parses a quality string, accepting resolutions and names
    ///
    /// Returns `None` for anything that is not one of the offered variants.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1366x768" | "low" => Some(Quality::Low),
            "1920x1080" | "high" => Some(Quality::High),
            _ => None,
        }
    }
}

/// Image orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    /// Parses an orientation name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "landscape" => Some(Orientation::Landscape),
            "portrait" => Some(Orientation::Portrait),
            _ => None,
        }
    }
}

/// A `<width>x<height>` resolution token as it appears in image URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the resolution with width and height swapped
    pub fn swapped(self) -> Self {
        Self::new(self.height, self.width)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<Resolution> for String {
    fn from(resolution: Resolution) -> Self {
        resolution.to_string()
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (width, height) = value
            .split_once('x')
            .ok_or_else(|| format!("invalid resolution: {}", value))?;
        let width = width
            .parse()
            .map_err(|_| format!("invalid resolution width: {}", value))?;
        let height = height
            .parse()
            .map_err(|_| format!("invalid resolution height: {}", value))?;
        Ok(Self::new(width, height))
    }
}

/// User-supplied options before validation
///
/// Every field is optional; missing fields receive defaults during
/// [`Configuration::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOptions {
    /// Day offset: -1 = tomorrow, 0 = today, 1 = yesterday, n = n days ago
    pub date_offset: Option<i64>,
    /// Number of images to request
    pub count: Option<i64>,
    /// Market/locale, e.g. "en-US"
    pub locale: Option<String>,
    /// Quality as a resolution ("1920x1080") or name ("high")
    pub quality: Option<String>,
    /// "landscape" or "portrait"
    pub orientation: Option<String>,
    /// Directory to cache images in
    pub cache_dir: Option<PathBuf>,
}

/// Normalized request configuration
///
/// This is also the content of the run marker, so equality is structural over
/// every field: any change, even a semantically irrelevant one, invalidates a
/// cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub date_offset: i64,
    pub count: u8,
    pub locale: String,
    pub quality: Quality,
    pub orientation: Orientation,
    /// Effective resolution embedded in image URLs (swapped for portrait)
    pub resolution: Resolution,
    pub cache_dir: Option<PathBuf>,
}

impl Configuration {
    /// Applies defaults and clamps raw options into a usable configuration
    ///
    /// # Arguments
    /// * `raw` - The options supplied by the caller
    /// * `default_locale` - Locale used when `raw.locale` is missing or empty
    pub fn normalize(raw: RawOptions, default_locale: &str) -> Self {
        let date_offset = raw.date_offset.unwrap_or(TODAY).max(TOMORROW);
        let count = raw
            .count
            .unwrap_or(1)
            .clamp(1, i64::from(LIMIT_N)) as u8;

        let locale = raw
            .locale
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_locale.to_string())
            .trim()
            .replace('_', "-");

        let quality = raw
            .quality
            .as_deref()
            .and_then(Quality::from_str)
            .unwrap_or_default();
        let orientation = raw
            .orientation
            .as_deref()
            .and_then(Orientation::from_str)
            .unwrap_or_default();

        let resolution = match orientation {
            Orientation::Landscape => quality.resolution(),
            Orientation::Portrait => quality.resolution().swapped(),
        };

        Self {
            date_offset,
            count,
            locale,
            quality,
            orientation,
            resolution,
            cache_dir: raw.cache_dir.filter(|dir| !dir.as_os_str().is_empty()),
        }
    }
}

/// Discovers the default locale from the process environment
///
/// Checks `LC_ALL`, `LC_MESSAGES` and `LANG` in order, strips encoding and
/// modifier suffixes, and converts to the API's `xx-YY` form. Falls back to
/// [`FALLBACK_LOCALE`].
pub fn system_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| locale_from_env_value(&value))
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}

/// Converts a POSIX locale value like "de_DE.UTF-8@euro" to "de-DE"
fn locale_from_env_value(value: &str) -> Option<String> {
    let base = value
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }

    Some(base.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: RawOptions) -> Configuration {
        Configuration::normalize(raw, "en-US")
    }

    #[test]
    fn test_defaults_applied_to_empty_options() {
        let config = normalize(RawOptions::default());
        assert_eq!(config.date_offset, TODAY);
        assert_eq!(config.count, 1);
        assert_eq!(config.locale, "en-US");
        assert_eq!(config.quality, Quality::High);
        assert_eq!(config.orientation, Orientation::Landscape);
        assert_eq!(config.resolution.to_string(), "1920x1080");
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_date_offset_clamped_to_tomorrow() {
        let config = normalize(RawOptions {
            date_offset: Some(-2),
            ..Default::default()
        });
        assert_eq!(config.date_offset, TOMORROW);

        let config = normalize(RawOptions {
            date_offset: Some(42),
            ..Default::default()
        });
        assert_eq!(config.date_offset, 42, "No upper bound on past offsets");
    }

    #[test]
    fn test_empty_cache_dir_disables_caching() {
        let config = normalize(RawOptions {
            cache_dir: Some(PathBuf::new()),
            ..Default::default()
        });
        assert!(config.cache_dir.is_none());

        let config = normalize(RawOptions {
            cache_dir: Some(PathBuf::from("/tmp/bing")),
            ..Default::default()
        });
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/bing")));
    }

    #[test]
    fn test_count_clamped() {
        for (raw, expected) in [(9, 8), (8, 8), (2, 2), (0, 1), (-2, 1)] {
            let config = normalize(RawOptions {
                count: Some(raw),
                ..Default::default()
            });
            assert_eq!(config.count, expected, "count {} should become {}", raw, expected);
        }
    }

    #[test]
    fn test_unavailable_quality_falls_back_to_high() {
        for raw in [Some("800x600"), Some("😳"), Some(""), None] {
            let config = normalize(RawOptions {
                quality: raw.map(String::from),
                ..Default::default()
            });
            assert_eq!(config.quality, Quality::High, "quality {:?}", raw);
        }
    }

    #[test]
    fn test_quality_accepts_resolution_and_name() {
        assert_eq!(Quality::from_str("1366x768"), Some(Quality::Low));
        assert_eq!(Quality::from_str("LOW"), Some(Quality::Low));
        assert_eq!(Quality::from_str("1920x1080"), Some(Quality::High));
        assert_eq!(Quality::from_str("high"), Some(Quality::High));
    }

    #[test]
    fn test_invalid_orientation_falls_back_to_landscape() {
        let config = normalize(RawOptions {
            orientation: Some("diagonal".to_string()),
            ..Default::default()
        });
        assert_eq!(config.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_portrait_swaps_resolution() {
        let config = normalize(RawOptions {
            quality: Some("1920x1080".to_string()),
            orientation: Some("Portrait".to_string()),
            ..Default::default()
        });
        assert_eq!(config.orientation, Orientation::Portrait);
        assert_eq!(config.resolution.to_string(), "1080x1920");

        let config = normalize(RawOptions {
            quality: Some("low".to_string()),
            orientation: Some("portrait".to_string()),
            ..Default::default()
        });
        assert_eq!(config.resolution.to_string(), "768x1366");
    }

    #[test]
    fn test_locale_normalization() {
        let config = normalize(RawOptions {
            locale: Some("de_DE".to_string()),
            ..Default::default()
        });
        assert_eq!(config.locale, "de-DE");

        let config = Configuration::normalize(
            RawOptions {
                locale: Some("  ".to_string()),
                ..Default::default()
            },
            "fr_FR",
        );
        assert_eq!(config.locale, "fr-FR");
    }

    #[test]
    fn test_configuration_serializes_resolution_as_string() {
        let config = normalize(RawOptions {
            orientation: Some("portrait".to_string()),
            cache_dir: Some(PathBuf::from("/tmp/bing")),
            ..Default::default()
        });
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["quality"], "1920x1080");
        assert_eq!(json["orientation"], "portrait");
        assert_eq!(json["resolution"], "1080x1920");

        let parsed: Configuration = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_resolution_rejects_garbage() {
        assert!(Resolution::try_from("1920-1080".to_string()).is_err());
        assert!(Resolution::try_from("axb".to_string()).is_err());
    }

    #[test]
    fn test_locale_from_env_value() {
        assert_eq!(locale_from_env_value("de_DE.UTF-8"), Some("de-DE".to_string()));
        assert_eq!(locale_from_env_value("ca_ES@valencia"), Some("ca-ES".to_string()));
        assert_eq!(locale_from_env_value("C.UTF-8"), None);
        assert_eq!(locale_from_env_value("POSIX"), None);
        assert_eq!(locale_from_env_value(""), None);
    }
}
