//! driftgate - validation and drift detection stage for tabular ML pipelines
//!
//! Takes the train/test partitions produced by ingestion, checks them against
//! the expected schema, runs a two-sample Kolmogorov-Smirnov test per numeric
//! column, always persists the drift report, and hands a
//! [`ValidationArtifact`] to the transformation stage.
//!
//! # Modules
//!
//! - [`schema`] - expected column schema
//! - [`validation`] - column checks and the stage orchestrator
//! - [`drift`] - KS test, drift detector, and report writer
//! - [`ingestion`] - feature store export and train/test split
//! - [`pipeline`] - runs the stages in order
//! - [`artifact`] - handoff records and the per-run directory layout
//! - [`config`] - configuration types and loading
//!
//! # Example
//!
//! ```ignore
//! use driftgate::{ArtifactLayout, Config, TrainingPipeline};
//!
//! let config = Config::load(None)?;
//! let layout = ArtifactLayout::timestamped(&config.artifact_dir);
//! let outcome = TrainingPipeline::new(config, layout).run()?;
//! println!("valid: {}", outcome.validation.validation_status);
//! ```

pub mod artifact;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod drift;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod validation;

pub use artifact::{ArtifactLayout, IngestionArtifact, ValidationArtifact};
pub use config::{Config, IngestionConfig, MismatchPolicy, ValidationConfig};
pub use drift::{ColumnDriftResult, DriftDetector, DriftReport, KsMethod, ReportWriter, YamlReportWriter};
pub use error::{PipelineError, Stage, ValidationError};
pub use ingestion::DataIngestion;
pub use pipeline::{PipelineOutcome, TrainingPipeline};
pub use schema::SchemaDefinition;
pub use validation::{ColumnCheck, DataValidation, validate_columns};
