// src/config/loader.rs
//! Configuration loader with layered TOML files

use crate::config::FeatureConfig;
use crate::error::EmgError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(#[from] EmgError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Loads a [`FeatureConfig`] from defaults overlaid with TOML files
///
/// Files are applied in order; a key present in a later file replaces the
/// same key from earlier layers, tables are merged key by key.
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    required: bool,
}

impl ConfigLoader {
    /// Loader with no files, yielding the defaults
    pub fn new() -> Self {
        Self {
            config_paths: Vec::new(),
            required: false,
        }
    }

    /// Create loader with custom paths; missing files are skipped
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            required: false,
        }
    }

    /// Treat a missing file as an error instead of skipping it
    pub fn require_files(mut self) -> Self {
        self.required = true;
        self
    }

    /// Add one more layer on top of the existing ones
    pub fn add_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_paths.push(path.into());
        self
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<FeatureConfig, ConfigError> {
        let mut merged = toml::Value::try_from(FeatureConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for config_path in &self.config_paths {
            match Self::load_config_file(config_path) {
                Ok(layer) => {
                    debug!(path = %config_path.display(), "merging configuration layer");
                    merge_toml_values(&mut merged, layer);
                }
                Err(ConfigError::FileNotFound(_)) if !self.required => continue,
                Err(e) => return Err(e),
            }
        }

        let config: FeatureConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;
        config.validate()?;

        info!(summary = ?config.get_summary(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate a configuration held in memory
    pub fn load_str(content: &str) -> Result<FeatureConfig, ConfigError> {
        let config: FeatureConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Export a configuration to file
    pub fn export_config<P: AsRef<Path>>(config: &FeatureConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_config_file<P: AsRef<Path>>(path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureSetKind;
    use std::io::Write;

    fn write_layer(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_no_files_gives_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, FeatureConfig::default());
    }

    #[test]
    fn test_later_layers_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_layer(&dir, "base.toml", "[windowing]\nlength = 200\nstride = 100\n");
        let local = write_layer(&dir, "local.toml", "feature_set = \"cepstral\"\n[windowing]\nstride = 50\n");

        let config = ConfigLoader::with_paths(vec![base, local]).load().unwrap();
        assert_eq!(config.windowing.length, 200);
        assert_eq!(config.windowing.stride, 50);
        assert_eq!(config.feature_set, FeatureSetKind::Cepstral);
    }

    #[test]
    fn test_missing_file_skipped_unless_required() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        assert!(ConfigLoader::with_paths(vec![missing.clone()]).load().is_ok());
        let err = ConfigLoader::with_paths(vec![missing]).require_files().load().unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let err = ConfigLoader::load_str("[time_domain]\nsmoothing_width = 4\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("smoothing_width"));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = ConfigLoader::load_str("[windowing\nlength = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exported.toml");
        let mut config = FeatureConfig::default();
        config.cepstral.include_deltas = false;

        ConfigLoader::export_config(&config, &path).unwrap();
        let loaded = ConfigLoader::new().add_path(&path).require_files().load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_disabled_top_db_survives_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_floor.toml");
        let mut config = FeatureConfig::default();
        config.cepstral.top_db = None;

        ConfigLoader::export_config(&config, &path).unwrap();
        let loaded = ConfigLoader::new().add_path(&path).require_files().load().unwrap();
        assert_eq!(loaded.cepstral.top_db, None);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_stray_delta_width_accepted_without_deltas() {
        let config = ConfigLoader::load_str("[cepstral]\ninclude_deltas = false\ndelta_width = 8\n").unwrap();
        assert_eq!(config.cepstral.delta_width, 8);
    }
}
