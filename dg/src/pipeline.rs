//! Stage wiring: ingestion -> validation
//!
//! Each stage finishes and returns its artifact before the next one starts.
//! Transformation and training consume the [`ValidationArtifact`] and live
//! outside this crate.

use serde::Serialize;
use tracing::info;

use crate::artifact::{ArtifactLayout, IngestionArtifact, ValidationArtifact};
use crate::config::Config;
use crate::error::PipelineError;
use crate::ingestion::DataIngestion;
use crate::validation::DataValidation;

/// Artifacts produced by one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub ingestion: IngestionArtifact,
    pub validation: ValidationArtifact,
}

/// Runs the data preparation stages in order
pub struct TrainingPipeline {
    config: Config,
    layout: ArtifactLayout,
}

impl TrainingPipeline {
    pub fn new(config: Config, layout: ArtifactLayout) -> Self {
        Self { config, layout }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Ingestion only
    pub fn ingest(&self) -> Result<IngestionArtifact, PipelineError> {
        DataIngestion::new(self.config.ingestion.clone(), self.layout.clone()).run()
    }

    /// Validation over partitions produced elsewhere
    pub fn validate(&self, ingestion: &IngestionArtifact) -> Result<ValidationArtifact, PipelineError> {
        let stage = DataValidation::new(
            &self.config.schema_file,
            self.config.validation.clone(),
            self.layout.clone(),
        )?;
        stage.run(ingestion)
    }

    /// Ingestion followed by validation
    pub fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        info!(root = %self.layout.root().display(), "Initiating the data ingestion");
        let ingestion = self.ingest()?;
        info!("Initiating the data validation");
        let validation = self.validate(&ingestion)?;
        info!(status = validation.validation_status, "Pipeline run completed");

        Ok(PipelineOutcome { ingestion, validation })
    }
}
