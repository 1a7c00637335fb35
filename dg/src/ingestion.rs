//! File-based ingestion stage
//!
//! Reads the exported source records, writes them to the feature store, and
//! splits them into seeded train/test partitions.

use polars::prelude::DataFrame;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::artifact::{ArtifactLayout, IngestionArtifact};
use crate::config::IngestionConfig;
use crate::dataset;
use crate::error::{PipelineError, ResultExt, Stage, ValidationError};

/// Produces the train/test partitions consumed by validation
pub struct DataIngestion {
    config: IngestionConfig,
    layout: ArtifactLayout,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig, layout: ArtifactLayout) -> Self {
        Self { config, layout }
    }

    /// Run the stage end to end
    pub fn run(&self) -> Result<IngestionArtifact, PipelineError> {
        info!("Starting data ingestion");
        let frame = self.read_source().at(Stage::ReadSource)?;
        self.export_feature_store(&frame).at(Stage::ExportFeatureStore)?;
        let artifact = self.split_train_test(&frame).at(Stage::SplitTrainTest)?;
        info!("Data ingestion completed");
        Ok(artifact)
    }

    fn read_source(&self) -> Result<DataFrame, ValidationError> {
        let path = &self.config.source_file;
        debug!(?path, "DataIngestion::read_source: called");

        let mut frame = dataset::read_csv(path, &self.config.null_values)?;
        if frame.height() == 0 {
            return Err(ValidationError::EmptyDataset { path: path.clone() });
        }

        for name in &self.config.drop_columns {
            if frame.column(name).is_ok() {
                debug!(column = %name, "DataIngestion::read_source: dropping column");
                frame = frame.drop(name).map_err(|e| ValidationError::data(path, e))?;
            }
        }

        info!(rows = frame.height(), columns = frame.width(), "Read source records");
        Ok(frame)
    }

    fn export_feature_store(&self, frame: &DataFrame) -> Result<(), ValidationError> {
        let path = self.layout.feature_store_file(&self.config.source_file);
        let mut frame = frame.clone();
        dataset::write_csv(&path, &mut frame)?;
        info!(path = %path.display(), "Feature store saved");
        Ok(())
    }

    fn split_train_test(&self, frame: &DataFrame) -> Result<IngestionArtifact, ValidationError> {
        let (train_rows, test_rows) = split_indices(frame.height(), self.config.test_ratio, self.config.seed);
        debug!(train = train_rows.len(), test = test_rows.len(), "DataIngestion::split_train_test: split");

        let trained_file_path = self.layout.train_file();
        let test_file_path = self.layout.test_file();

        let mut train = dataset::take_rows(frame, &train_rows).map_err(|e| ValidationError::data(&trained_file_path, e))?;
        let mut test = dataset::take_rows(frame, &test_rows).map_err(|e| ValidationError::data(&test_file_path, e))?;

        dataset::write_csv(&trained_file_path, &mut train)?;
        dataset::write_csv(&test_file_path, &mut test)?;
        info!(train = train.height(), test = test.height(), "Train-test split completed");

        Ok(IngestionArtifact {
            trained_file_path,
            test_file_path,
        })
    }
}

/// Shuffle `0..rows` with a seeded RNG; the first `ceil(rows * test_ratio)` go to test
pub fn split_indices(rows: usize, test_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((rows as f64) * test_ratio).ceil() as usize;
    let test_len = test_len.min(rows);
    let train = indices.split_off(test_len);
    (train, indices)
}
