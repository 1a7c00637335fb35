//! Per-column drift detection between a baseline and a comparison dataset

use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use super::ks::{KsMethod, ks_2samp};
use super::report::{ColumnDriftResult, DriftReport, ReportWriter};
use crate::dataset;
use crate::error::ValidationError;

/// Default significance level
pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// Runs a two-sample KS test on every numeric baseline column
#[derive(Debug, Clone, Copy)]
pub struct DriftDetector {
    threshold: f64,
    method: KsMethod,
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, KsMethod::Auto)
    }
}

impl DriftDetector {
    pub fn new(threshold: f64, method: KsMethod) -> Self {
        Self { threshold, method }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Test every numeric column of `baseline` against `comparison`
    ///
    /// The report is handed to `writer` before returning, whether or not any
    /// column drifted. Returns the report and the overall pass flag (true when
    /// no column drifted). A baseline column missing from `comparison` fails
    /// the whole call before anything is written.
    pub fn detect_drift(
        &self,
        baseline: &DataFrame,
        comparison: &DataFrame,
        writer: &dyn ReportWriter,
    ) -> Result<(DriftReport, bool), ValidationError> {
        debug!(
            threshold = self.threshold,
            baseline_rows = baseline.height(),
            comparison_rows = comparison.height(),
            "DriftDetector::detect_drift: called"
        );

        let missing: Vec<String> = dataset::column_names(baseline)
            .into_iter()
            .filter(|name| comparison.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::schema_mismatch(format!(
                "comparison dataset is missing baseline columns: {}",
                missing.join(", ")
            )));
        }

        let report = self.build_report(baseline, comparison)?;
        writer.write_report(&report)?;

        let drifted = report.drifted_columns();
        let passed = drifted.is_empty();
        if passed {
            info!(columns = report.len(), "No data drift detected");
        } else {
            warn!("Data drift detected in columns: {:?}", drifted);
        }

        Ok((report, passed))
    }

    fn build_report(&self, baseline: &DataFrame, comparison: &DataFrame) -> Result<DriftReport, ValidationError> {
        let mut report = DriftReport::new();

        for name in dataset::numeric_columns(baseline) {
            let base_column = baseline
                .column(&name)
                .map_err(|e| ValidationError::StatisticalTest(e.to_string()))?;
            let comparison_column = comparison
                .column(&name)
                .map_err(|e| ValidationError::schema_mismatch(e.to_string()))?;

            let base = dataset::numeric_values(base_column)?;
            let current = dataset::numeric_values(comparison_column)?;
            report.push(self.test_column(&name, &base, &current)?);
        }

        Ok(report)
    }

    /// Test one column's samples
    ///
    /// An empty side is not an error: the column is recorded as not drifted
    /// with a note.
    pub fn test_column(&self, column: &str, base: &[f64], current: &[f64]) -> Result<ColumnDriftResult, ValidationError> {
        if base.is_empty() || current.is_empty() {
            let side = if base.is_empty() { "baseline" } else { "comparison" };
            let note = format!("{} sample has no values; drift test skipped", side);
            warn!(column, "{}", note);
            return Ok(ColumnDriftResult::untested(column, note));
        }

        let ks = ks_2samp(base, current, self.method)?;
        debug!(column, statistic = ks.statistic, p_value = ks.p_value, "DriftDetector::test_column: tested");
        Ok(ColumnDriftResult::new(column, ks.statistic, ks.p_value, self.threshold))
    }
}
