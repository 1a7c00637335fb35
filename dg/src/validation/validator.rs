//! Validation stage orchestrator
//!
//! Linear sequence, no step is revisited:
//!
//! ```text
//! READ(train, test) -> VALIDATE_COLUMNS(train) -> VALIDATE_COLUMNS(test)
//!   -> DETECT_DRIFT -> PERSIST_VALID_COPIES -> EMIT_ARTIFACT
//! ```

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use super::columns::{ColumnCheck, check_columns};
use crate::artifact::{ArtifactLayout, IngestionArtifact, ValidationArtifact};
use crate::config::{MismatchPolicy, ValidationConfig};
use crate::dataset;
use crate::drift::{DriftDetector, YamlReportWriter};
use crate::error::{PipelineError, ResultExt, Stage, ValidationError};
use crate::schema::SchemaDefinition;

/// Validates the ingested partitions and hands off to transformation
pub struct DataValidation {
    config: ValidationConfig,
    layout: ArtifactLayout,
    schema: SchemaDefinition,
    detector: DriftDetector,
}

impl DataValidation {
    /// Load the schema and prepare the stage; fails before touching any data
    pub fn new(
        schema_file: impl AsRef<Path>,
        config: ValidationConfig,
        layout: ArtifactLayout,
    ) -> Result<Self, PipelineError> {
        let schema = SchemaDefinition::load(schema_file).at(Stage::LoadSchema)?;
        Ok(Self::with_schema(schema, config, layout))
    }

    /// Build the stage around an already-loaded schema
    pub fn with_schema(schema: SchemaDefinition, config: ValidationConfig, layout: ArtifactLayout) -> Self {
        let detector = DriftDetector::new(config.drift_threshold, config.ks_method);
        Self {
            config,
            layout,
            schema,
            detector,
        }
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// Run the stage over the partitions named by `ingestion`
    pub fn run(&self, ingestion: &IngestionArtifact) -> Result<ValidationArtifact, PipelineError> {
        info!("Starting data validation");
        debug!(?ingestion, "DataValidation::run: called");

        let train = self.read_partition(&ingestion.trained_file_path).at(Stage::ReadTrain)?;
        let test = self.read_partition(&ingestion.test_file_path).at(Stage::ReadTest)?;

        let mut messages = Vec::new();
        let mut columns_ok = true;
        for (name, frame) in [("train", &train), ("test", &test)] {
            let check = check_columns(name, frame, &self.schema);
            if !self.accept_column_check(&check)? {
                columns_ok = false;
                messages.extend(check.diagnostic());
            }
        }

        let writer = YamlReportWriter::new(self.layout.drift_report_file());
        let (report, drift_passed) = self
            .detector
            .detect_drift(&train, &test, &writer)
            .at(Stage::DetectDrift)?;
        if !drift_passed {
            messages.push(format!(
                "data drift detected in columns: {}",
                report.drifted_columns().join(", ")
            ));
        }

        let (invalid_train_file_path, invalid_test_file_path) = self.persist_copies(train, test)?;

        let artifact = ValidationArtifact {
            validation_status: columns_ok && drift_passed,
            valid_train_file_path: self.layout.valid_train_file(),
            valid_test_file_path: self.layout.valid_test_file(),
            invalid_train_file_path,
            invalid_test_file_path,
            drift_report_file_path: self.layout.drift_report_file(),
            messages,
        };

        info!(status = artifact.validation_status, "Data validation completed");
        Ok(artifact)
    }

    /// Read a partition, typing its empty columns from the schema
    fn read_partition(&self, path: &Path) -> Result<DataFrame, ValidationError> {
        let mut frame = dataset::read_csv(path, &self.config.null_values)?;
        dataset::conform_to_schema(&mut frame, &self.schema).map_err(|e| ValidationError::data(path, e))?;
        Ok(frame)
    }

    /// Apply the mismatch policy; Ok(false) means "record and continue"
    #[track_caller]
    fn accept_column_check(&self, check: &ColumnCheck) -> Result<bool, PipelineError> {
        let Some(diagnostic) = check.diagnostic() else {
            return Ok(true);
        };

        match self.config.on_column_mismatch {
            MismatchPolicy::Degrade => {
                warn!("{}", diagnostic);
                Ok(false)
            }
            MismatchPolicy::Abort => Err(PipelineError::new(
                Stage::ValidateColumns,
                ValidationError::schema_mismatch(diagnostic),
            )),
        }
    }

    /// Write validated copies, and quarantined rows when enabled
    fn persist_copies(
        &self,
        train: DataFrame,
        test: DataFrame,
    ) -> Result<(Option<PathBuf>, Option<PathBuf>), PipelineError> {
        let targets = [
            (train, self.layout.valid_train_file(), self.layout.invalid_train_file()),
            (test, self.layout.valid_test_file(), self.layout.invalid_test_file()),
        ];

        let mut invalid_paths = Vec::with_capacity(2);
        for (frame, valid_path, invalid_path) in targets {
            if self.config.quarantine_incomplete_rows {
                let (mut complete, mut incomplete) = dataset::split_complete_rows(&frame)
                    .map_err(|e| ValidationError::data(&valid_path, e))
                    .at(Stage::PersistValidCopies)?;
                info!(
                    valid = complete.height(),
                    invalid = incomplete.height(),
                    path = %valid_path.display(),
                    "Quarantining incomplete rows"
                );
                dataset::write_csv(&valid_path, &mut complete).at(Stage::PersistValidCopies)?;
                dataset::write_csv(&invalid_path, &mut incomplete).at(Stage::PersistValidCopies)?;
                invalid_paths.push(Some(invalid_path));
            } else {
                let mut frame = frame;
                dataset::write_csv(&valid_path, &mut frame).at(Stage::PersistValidCopies)?;
                invalid_paths.push(None);
            }
        }

        let test_invalid = invalid_paths.pop().flatten();
        let train_invalid = invalid_paths.pop().flatten();
        Ok((train_invalid, test_invalid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::DriftReport;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = "columns:\n  - a: int64\n  - b: float64\n  - label: object\n";

    fn setup(train: &str, test: &str) -> (TempDir, IngestionArtifact, PathBuf) {
        let temp = TempDir::new().unwrap();
        let schema_path = temp.path().join("schema.yaml");
        fs::write(&schema_path, SCHEMA).unwrap();

        let trained_file_path = temp.path().join("train.csv");
        let test_file_path = temp.path().join("test.csv");
        fs::write(&trained_file_path, train).unwrap();
        fs::write(&test_file_path, test).unwrap();

        let artifact = IngestionArtifact {
            trained_file_path,
            test_file_path,
        };
        (temp, artifact, schema_path)
    }

    const SAME: &str = "a,b,label\n1,0.5,x\n2,1.5,y\n3,2.5,x\n4,3.5,y\n";

    #[test]
    fn test_clean_run() {
        let (temp, ingestion, schema) = setup(SAME, SAME);
        let layout = ArtifactLayout::at(temp.path().join("run"));
        let stage = DataValidation::new(&schema, ValidationConfig::default(), layout.clone()).unwrap();

        let artifact = stage.run(&ingestion).unwrap();

        assert!(artifact.validation_status);
        assert!(artifact.messages.is_empty());
        assert_eq!(artifact.valid_train_file_path, layout.valid_train_file());
        assert!(artifact.valid_train_file_path.exists());
        assert!(artifact.valid_test_file_path.exists());
        assert!(artifact.drift_report_file_path.exists());
        assert!(artifact.invalid_train_file_path.is_none());
        assert!(artifact.invalid_test_file_path.is_none());
    }

    #[test]
    fn test_column_mismatch_degrades_status() {
        let (temp, ingestion, schema) = setup(SAME, "a,b,label,extra\n1,0.5,x,0\n2,1.5,y,0\n3,2.5,x,1\n4,3.5,y,1\n");
        let layout = ArtifactLayout::at(temp.path().join("run"));
        let stage = DataValidation::new(&schema, ValidationConfig::default(), layout).unwrap();

        let artifact = stage.run(&ingestion).unwrap();

        assert!(!artifact.validation_status);
        assert_eq!(artifact.messages.len(), 1);
        assert!(artifact.messages[0].starts_with("test dataframe has 4 columns"));
        assert!(artifact.drift_report_file_path.exists());
    }

    #[test]
    fn test_column_mismatch_abort_policy() {
        let (temp, ingestion, schema) = setup("a,b\n1,0.5\n", SAME);
        let layout = ArtifactLayout::at(temp.path().join("run"));
        let config = ValidationConfig {
            on_column_mismatch: MismatchPolicy::Abort,
            ..Default::default()
        };
        let stage = DataValidation::new(&schema, config, layout.clone()).unwrap();

        let err = stage.run(&ingestion).unwrap_err();

        assert_eq!(err.stage, Stage::ValidateColumns);
        assert!(err.validation_error().is_schema_mismatch());
        assert!(!layout.drift_report_file().exists());
    }

    #[test]
    fn test_missing_schema_fails_before_validation() {
        let temp = TempDir::new().unwrap();
        let layout = ArtifactLayout::at(temp.path().join("run"));

        let err = match DataValidation::new(temp.path().join("absent.yaml"), ValidationConfig::default(), layout.clone()) {
            Ok(_) => panic!("schema load should fail"),
            Err(e) => e,
        };

        assert_eq!(err.stage, Stage::LoadSchema);
        assert!(err.validation_error().is_config());
        assert!(!layout.drift_report_file().exists());
    }

    #[test]
    fn test_unreadable_train_is_fatal() {
        let (temp, mut ingestion, schema) = setup(SAME, SAME);
        ingestion.trained_file_path = temp.path().join("missing.csv");
        let layout = ArtifactLayout::at(temp.path().join("run"));
        let stage = DataValidation::new(&schema, ValidationConfig::default(), layout.clone()).unwrap();

        let err = stage.run(&ingestion).unwrap_err();

        assert_eq!(err.stage, Stage::ReadTrain);
        assert!(err.file.ends_with("validator.rs"));
        assert!(!layout.valid_train_file().exists());
    }

    #[test]
    fn test_all_null_test_column_is_noted_not_fatal() {
        let (temp, ingestion, schema) = setup(SAME, "a,b,label\n1,na,x\n2,na,y\n");
        let layout = ArtifactLayout::at(temp.path().join("run"));
        let stage = DataValidation::new(&schema, ValidationConfig::default(), layout).unwrap();

        let artifact = stage.run(&ingestion).unwrap();

        let report = DriftReport::load(&artifact.drift_report_file_path).unwrap();
        let b = report.get("b").unwrap();
        assert!(!b.drift_detected);
        assert!(b.note.is_some());
        assert!(report.get("a").unwrap().note.is_none());
    }

    #[test]
    fn test_quarantine_splits_incomplete_rows() {
        let train = "a,b,label\n1,0.5,x\n2,na,y\n3,2.5,x\n4,3.5,y\n";
        let (temp, ingestion, schema) = setup(train, SAME);
        let layout = ArtifactLayout::at(temp.path().join("run"));
        let config = ValidationConfig {
            quarantine_incomplete_rows: true,
            ..Default::default()
        };
        let stage = DataValidation::new(&schema, config, layout.clone()).unwrap();

        let artifact = stage.run(&ingestion).unwrap();

        let invalid_train = artifact.invalid_train_file_path.clone().unwrap();
        let invalid_test = artifact.invalid_test_file_path.clone().unwrap();
        assert_eq!(invalid_train, layout.invalid_train_file());

        let valid = dataset::read_csv(&artifact.valid_train_file_path, &[]).unwrap();
        let invalid = dataset::read_csv(&invalid_train, &[]).unwrap();
        assert_eq!(valid.height(), 3);
        assert_eq!(invalid.height(), 1);
        assert_eq!(dataset::read_csv(&invalid_test, &[]).unwrap().height(), 0);
    }
}
