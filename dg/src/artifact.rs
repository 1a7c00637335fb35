//! Stage handoff records and the on-disk artifact layout
//!
//! Each stage returns an artifact by value; the next stage only reads it.
//!
//! ```text
//! artifacts/
//! └── {MM_DD_YYYY_HH_MM_SS}/
//!     ├── data_ingestion/
//!     │   ├── feature_store/{source file}
//!     │   └── ingested/{train,test}.csv
//!     └── data_validation/
//!         ├── validated/{train,test}.csv
//!         ├── invalid/{train,test}.csv
//!         └── drift_report/report.yaml
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const DRIFT_REPORT_FILE_NAME: &str = "report.yaml";
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

/// Output of the ingestion stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionArtifact {
    pub trained_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

/// Output of the validation stage, consumed by transformation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationArtifact {
    /// True when every column check passed and no column drifted
    pub validation_status: bool,
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub invalid_train_file_path: Option<PathBuf>,
    pub invalid_test_file_path: Option<PathBuf>,
    pub drift_report_file_path: PathBuf,
    /// Diagnostics recorded during the run (column mismatches, drifted columns)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// Paths for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    /// Layout rooted at `root`
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout under `base/<local timestamp>`
    pub fn timestamped(base: impl AsRef<Path>) -> Self {
        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::at(base.as_ref().join(stamp))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ingestion_dir(&self) -> PathBuf {
        self.root.join("data_ingestion")
    }

    fn validation_dir(&self) -> PathBuf {
        self.root.join("data_validation")
    }

    /// Feature store copy of the source, keeping its file name
    pub fn feature_store_file(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "feature_store.csv".into());
        self.ingestion_dir().join("feature_store").join(name)
    }

    pub fn train_file(&self) -> PathBuf {
        self.ingestion_dir().join("ingested").join(TRAIN_FILE_NAME)
    }

    pub fn test_file(&self) -> PathBuf {
        self.ingestion_dir().join("ingested").join(TEST_FILE_NAME)
    }

    pub fn valid_train_file(&self) -> PathBuf {
        self.validation_dir().join("validated").join(TRAIN_FILE_NAME)
    }

    pub fn valid_test_file(&self) -> PathBuf {
        self.validation_dir().join("validated").join(TEST_FILE_NAME)
    }

    pub fn invalid_train_file(&self) -> PathBuf {
        self.validation_dir().join("invalid").join(TRAIN_FILE_NAME)
    }

    pub fn invalid_test_file(&self) -> PathBuf {
        self.validation_dir().join("invalid").join(TEST_FILE_NAME)
    }

    pub fn drift_report_file(&self) -> PathBuf {
        self.validation_dir().join("drift_report").join(DRIFT_REPORT_FILE_NAME)
    }
}
