//! driftgate configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::drift::{DEFAULT_THRESHOLD, KsMethod};

/// Main driftgate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory; each run writes under `<artifact-dir>/<timestamp>/`
    #[serde(rename = "artifact-dir")]
    pub artifact_dir: PathBuf,

    /// Expected column schema
    #[serde(rename = "schema-file")]
    pub schema_file: PathBuf,

    /// Directory for per-run log files
    #[serde(rename = "log-dir")]
    pub log_dir: PathBuf,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Ingestion stage settings
    pub ingestion: IngestionConfig,

    /// Validation stage settings
    pub validation: ValidationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            schema_file: PathBuf::from("data_schema").join("schema.yaml"),
            log_dir: PathBuf::from("logs"),
            log_level: None,
            ingestion: IngestionConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        let threshold = self.validation.drift_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(eyre::eyre!("validation.drift-threshold must be in (0, 1), got {}", threshold));
        }

        let ratio = self.ingestion.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(eyre::eyre!("ingestion.test-ratio must be in (0, 1), got {}", ratio));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .driftgate.yml
        let local_config = PathBuf::from(".driftgate.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/driftgate/driftgate.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("driftgate").join("driftgate.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Ingestion stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Raw records exported from the document store
    #[serde(rename = "source-file")]
    pub source_file: PathBuf,

    /// Fraction of rows held out for the test partition
    #[serde(rename = "test-ratio")]
    pub test_ratio: f64,

    /// Seed for the train/test shuffle
    pub seed: u64,

    /// Columns removed before the feature store is written
    #[serde(rename = "drop-columns")]
    pub drop_columns: Vec<String>,

    /// Cell values read as missing
    #[serde(rename = "null-values")]
    pub null_values: Vec<String>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            source_file: PathBuf::from("data").join("source.csv"),
            test_ratio: 0.2,
            seed: 42,
            drop_columns: vec!["_id".to_string()],
            null_values: vec!["na".to_string()],
        }
    }
}

/// What a column-count mismatch does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Record the mismatch and report the run as not valid
    #[default]
    Degrade,
    /// Fail the run with a schema mismatch error
    Abort,
}

/// Validation stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Significance level; a column drifts when its p-value is below this
    #[serde(rename = "drift-threshold")]
    pub drift_threshold: f64,

    /// KS p-value computation
    #[serde(rename = "ks-method")]
    pub ks_method: KsMethod,

    /// Behavior when a partition's column count differs from the schema
    #[serde(rename = "on-column-mismatch")]
    pub on_column_mismatch: MismatchPolicy,

    /// Move rows with missing values to the invalid partitions
    #[serde(rename = "quarantine-incomplete-rows")]
    pub quarantine_incomplete_rows: bool,

    /// Cell values read as missing
    #[serde(rename = "null-values")]
    pub null_values: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            drift_threshold: DEFAULT_THRESHOLD,
            ks_method: KsMethod::Auto,
            on_column_mismatch: MismatchPolicy::Degrade,
            quarantine_incomplete_rows: false,
            null_values: vec!["na".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.validation.drift_threshold, 0.05);
        assert_eq!(config.validation.on_column_mismatch, MismatchPolicy::Degrade);
        assert_eq!(config.ingestion.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "\
artifact-dir: out
validation:
  drift-threshold: 0.01
  ks-method: exact
  on-column-mismatch: abort
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.artifact_dir, PathBuf::from("out"));
        assert_eq!(config.validation.drift_threshold, 0.01);
        assert_eq!(config.validation.ks_method, KsMethod::Exact);
        assert_eq!(config.validation.on_column_mismatch, MismatchPolicy::Abort);
        assert!(!config.validation.quarantine_incomplete_rows);
        assert_eq!(config.ingestion.test_ratio, 0.2);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.validation.drift_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ingestion.test_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("driftgate.yml");
        fs::write(&path, "log-level: DEBUG\ningestion:\n  seed: 7\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.ingestion.seed, 7);
        assert_eq!(config.log_level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
