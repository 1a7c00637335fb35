//! Error types for the validation pipeline
//!
//! Components return [`ValidationError`]. When a failure crosses a stage
//! boundary it is wrapped into a [`PipelineError`] carrying the stage name and
//! the `(file, line)` of the call site that attached it.

use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised inside a single component
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process data in {path}: {source}")]
    Data {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Statistical test failed: {0}")]
    StatisticalTest(String),

    #[error("Dataset is empty: {path}")]
    EmptyDataset { path: PathBuf },
}

impl ValidationError {
    pub fn config(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn data(path: impl Into<PathBuf>, source: PolarsError) -> Self {
        Self::Data {
            path: path.into(),
            source,
        }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Check if this is a structural column mismatch
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, ValidationError::SchemaMismatch { .. })
    }

    /// Check if this came from loading configuration or the schema
    pub fn is_config(&self) -> bool {
        matches!(self, ValidationError::Config { .. })
    }
}

/// Pipeline operation that was running when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadSchema,
    ReadSource,
    ExportFeatureStore,
    SplitTrainTest,
    ReadTrain,
    ReadTest,
    ValidateColumns,
    DetectDrift,
    PersistValidCopies,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadSchema => "load_schema",
            Self::ReadSource => "read_source",
            Self::ExportFeatureStore => "export_feature_store",
            Self::SplitTrainTest => "split_train_test",
            Self::ReadTrain => "read_train",
            Self::ReadTest => "read_test",
            Self::ValidateColumns => "validate_columns",
            Self::DetectDrift => "detect_drift",
            Self::PersistValidCopies => "persist_valid_copies",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`ValidationError`] tagged with the stage and source location it surfaced at
#[derive(Debug, Error)]
#[error("error in stage [{stage}] at [{file}:{line}]: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub file: &'static str,
    pub line: u32,
    #[source]
    pub source: ValidationError,
}

impl PipelineError {
    /// Wrap an error, recording the caller's location
    #[track_caller]
    pub fn new(stage: Stage, source: ValidationError) -> Self {
        let location = Location::caller();
        Self {
            stage,
            file: location.file(),
            line: location.line(),
            source,
        }
    }

    pub fn validation_error(&self) -> &ValidationError {
        &self.source
    }
}

/// Attach a pipeline stage to a component result
pub trait ResultExt<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> ResultExt<T> for Result<T, ValidationError> {
    #[track_caller]
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        // Location must be read here; closures do not inherit #[track_caller]
        let location = Location::caller();
        self.map_err(|source| PipelineError {
            stage,
            file: location.file(),
            line: location.line(),
            source,
        })
    }
}
