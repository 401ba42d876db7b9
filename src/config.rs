//! Run configuration
//!
//! Every run reads the same four locations and field names. The defaults match
//! the Open Images layout the mapper was written for; a JSON file in the user's
//! config directory can override any subset of them:
//! - Linux: ~/.config/openimage-mapper/config.json
//! - macOS: ~/Library/Application Support/openimage-mapper/config.json
//! - Windows: %APPDATA%\openimage-mapper\config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MapperError, Result};

/// All fixed inputs of a mapping run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MapperConfig {
    // ========== Locations ==========
    /// Open Images metadata table (ImageID ↔ OriginalURL)
    pub metadata_csv: PathBuf,

    /// Parent folder of the local mirror (train_0/, train_1/, ...)
    pub image_root: PathBuf,

    /// JSONL dataset to augment
    pub records_in: PathBuf,

    /// Augmented JSONL, truncated on every run
    pub records_out: PathBuf,

    // ========== Metadata table ==========
    pub url_column: String,
    pub id_column: String,

    /// Single ASCII character separating columns
    pub delimiter: String,

    // ========== Local mirror ==========
    /// Extension without the dot, compared case-insensitively
    pub image_extension: String,

    // ========== Records ==========
    /// Field holding the source URL
    pub url_field: String,

    /// Field added with the resolved path (or null)
    pub path_field: String,

    /// Skip and count lines that are not JSON objects instead of aborting
    pub skip_malformed_lines: bool,

    // ========== Reporting ==========
    /// Log a progress line every N records
    pub progress_interval: usize,

    /// tracing filter directive, e.g. "info" or "openimage_mapper=debug"
    pub log_level: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            metadata_csv: PathBuf::from("/openimages/train-images-boxable-with-rotation.csv"),
            image_root: PathBuf::from("/openimages/openimage_source_images"),
            records_in: PathBuf::from("/openimages/sft.jsonl"),
            records_out: PathBuf::from("/openimages/sft_with_local_source_images.jsonl"),
            url_column: "OriginalURL".to_string(),
            id_column: "ImageID".to_string(),
            delimiter: ",".to_string(),
            image_extension: "jpg".to_string(),
            url_field: "open_image_input_url".to_string(),
            path_field: "local_input_image".to_string(),
            skip_malformed_lines: false,
            progress_interval: 100_000,
            log_level: "info".to_string(),
        }
    }
}

impl MapperConfig {
    /// Load the config file if there is one, otherwise the defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Where the optional config file lives
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("openimage-mapper");
        path.push("config.json");
        Some(path)
    }

    /// Read and validate a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| MapperError::io(path, e))?;
        let config = Self::from_json(&json).map_err(|source| MapperError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON; missing keys fall back to the defaults
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;

        if self.image_extension.trim_start_matches('.').is_empty() {
            return Err(MapperError::InvalidConfig(
                "image_extension must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("url_column", &self.url_column),
            ("id_column", &self.id_column),
            ("url_field", &self.url_field),
            ("path_field", &self.path_field),
        ] {
            if value.is_empty() {
                return Err(MapperError::InvalidConfig(format!("{name} must not be empty")));
            }
        }
        if self.progress_interval == 0 {
            return Err(MapperError::InvalidConfig(
                "progress_interval must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// The delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(MapperError::InvalidConfig(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }

    /// Extension without a leading dot, lowercased for comparison
    pub fn normalized_extension(&self) -> String {
        self.image_extension.trim_start_matches('.').to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MapperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.delimiter_byte().unwrap(), b',');
        assert_eq!(config.url_field, "open_image_input_url");
        assert_eq!(config.path_field, "local_input_image");
    }

    #[test]
    fn test_serialization() {
        let mut config = MapperConfig::default();
        config.image_root = PathBuf::from("/data/images");
        config.skip_malformed_lines = true;
        config.delimiter = "\t".to_string();

        let json = config.to_json().unwrap();
        let restored = MapperConfig::from_json(&json).unwrap();

        assert_eq!(config, restored);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = MapperConfig::from_json(r#"{ "image_root": "/mnt/mirror" }"#).unwrap();

        assert_eq!(config.image_root, PathBuf::from("/mnt/mirror"));
        assert_eq!(config.metadata_csv, MapperConfig::default().metadata_csv);
        assert_eq!(config.id_column, "ImageID");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "image_extension": "PNG", "progress_interval": 10 }"#).unwrap();

        let config = MapperConfig::from_file(&path).unwrap();
        assert_eq!(config.normalized_extension(), "png");
        assert_eq!(config.progress_interval, 10);
    }

    #[test]
    fn test_from_file_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = MapperConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, MapperError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MapperConfig::default();
        config.delimiter = ";;".to_string();
        assert!(matches!(config.validate(), Err(MapperError::InvalidConfig(_))));

        let mut config = MapperConfig::default();
        config.image_extension = ".".to_string();
        assert!(config.validate().is_err());

        let mut config = MapperConfig::default();
        config.path_field = String::new();
        assert!(config.validate().is_err());

        let mut config = MapperConfig::default();
        config.progress_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extension_normalization() {
        let mut config = MapperConfig::default();
        config.image_extension = ".JPG".to_string();
        assert_eq!(config.normalized_extension(), "jpg");
    }
}
