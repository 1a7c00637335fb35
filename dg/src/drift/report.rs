//! Drift report types and persistence

use std::fs;
use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ValidationError;

/// Outcome of the distribution test for one numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDriftResult {
    pub column: String,
    pub test_statistic: f64,
    pub p_value: f64,
    pub drift_detected: bool,
    /// Set when the column could not be tested normally (e.g. empty sample)
    pub note: Option<String>,
}

/// Per-column fields as they appear in the report file
#[derive(Debug, Serialize, Deserialize)]
struct ReportEntry {
    ks_statistic: f64,
    p_value: f64,
    drift_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl ColumnDriftResult {
    /// Result for a tested column; drift when `p_value < threshold`
    pub fn new(column: impl Into<String>, test_statistic: f64, p_value: f64, threshold: f64) -> Self {
        Self {
            column: column.into(),
            test_statistic,
            p_value,
            drift_detected: p_value < threshold,
            note: None,
        }
    }

    /// Result for a column with nothing to compare
    pub fn untested(column: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            test_statistic: 0.0,
            p_value: 1.0,
            drift_detected: false,
            note: Some(note.into()),
        }
    }

    fn entry(&self) -> ReportEntry {
        ReportEntry {
            ks_statistic: self.test_statistic,
            p_value: self.p_value,
            drift_detected: self.drift_detected,
            note: self.note.clone(),
        }
    }
}

/// Ordered column name -> result mapping, one entry per tested column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftReport {
    results: Vec<ColumnDriftResult>,
}

impl DriftReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result; a result for an already-present column replaces it in place
    pub fn push(&mut self, result: ColumnDriftResult) {
        match self.results.iter_mut().find(|r| r.column == result.column) {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnDriftResult> {
        self.results.iter().find(|r| r.column == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDriftResult> {
        self.results.iter()
    }

    pub fn columns(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.column.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Columns whose test rejected "same distribution"
    pub fn drifted_columns(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.drift_detected)
            .map(|r| r.column.as_str())
            .collect()
    }

    /// True when no column drifted
    pub fn passed(&self) -> bool {
        !self.results.iter().any(|r| r.drift_detected)
    }

    /// Parse a report previously written by [`YamlReportWriter`]
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(content)?;
        let mut report = Self::new();
        for (key, value) in mapping {
            let column = match key {
                serde_yaml::Value::String(s) => s,
                other => serde_yaml::to_string(&other)?.trim().to_string(),
            };
            let entry: ReportEntry = serde_yaml::from_value(value)?;
            report.push(ColumnDriftResult {
                column,
                test_statistic: entry.ks_statistic,
                p_value: entry.p_value,
                drift_detected: entry.drift_detected,
                note: entry.note,
            });
        }
        Ok(report)
    }

    /// Read a persisted report
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ValidationError::io(path, e))?;
        Self::from_yaml(&content).map_err(|e| ValidationError::config(path, e))
    }
}

impl Serialize for DriftReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for result in &self.results {
            map.serialize_entry(&result.column, &result.entry())?;
        }
        map.end()
    }
}

/// Durable sink for drift reports
pub trait ReportWriter {
    /// Persist the report; failures must reach the caller
    fn write_report(&self, report: &DriftReport) -> Result<(), ValidationError>;

    /// Where the report ends up
    fn location(&self) -> &Path;
}

/// Writes the report as a YAML mapping of mappings, overwriting any previous file
#[derive(Debug, Clone)]
pub struct YamlReportWriter {
    path: PathBuf,
}

impl YamlReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportWriter for YamlReportWriter {
    fn write_report(&self, report: &DriftReport) -> Result<(), ValidationError> {
        debug!(path = ?self.path, columns = report.len(), "YamlReportWriter::write_report: called");
        write_report(&self.path, report)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Serialize `report` to `path`, creating parent directories
pub fn write_report(path: &Path, report: &DriftReport) -> Result<(), ValidationError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ValidationError::io(parent, e))?;
    }

    let content = serde_yaml::to_string(report).map_err(|e| ValidationError::io(path, std::io::Error::other(e)))?;
    fs::write(path, content).map_err(|e| ValidationError::io(path, e))?;

    info!(path = %path.display(), columns = report.len(), "Drift report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_report() -> DriftReport {
        let mut report = DriftReport::new();
        report.push(ColumnDriftResult::new("zeta", 0.12, 0.40, 0.05));
        report.push(ColumnDriftResult::new("alpha", 0.61, 0.001, 0.05));
        report.push(ColumnDriftResult::untested("empty_col", "comparison sample is empty"));
        report
    }

    #[test]
    fn test_drift_decision_uses_strict_threshold() {
        assert!(!ColumnDriftResult::new("x", 0.1, 0.05, 0.05).drift_detected);
        assert!(ColumnDriftResult::new("x", 0.1, 0.0499, 0.05).drift_detected);
    }

    #[test]
    fn test_report_summary() {
        let report = sample_report();
        assert_eq!(report.columns(), vec!["zeta", "alpha", "empty_col"]);
        assert_eq!(report.drifted_columns(), vec!["alpha"]);
        assert!(!report.passed());
        assert!(DriftReport::new().passed());
    }

    #[test]
    fn test_push_replaces_existing_column() {
        let mut report = DriftReport::new();
        report.push(ColumnDriftResult::new("x", 0.1, 0.5, 0.05));
        report.push(ColumnDriftResult::new("x", 0.9, 0.0, 0.05));
        assert_eq!(report.len(), 1);
        assert!(report.get("x").unwrap().drift_detected);
    }

    #[test]
    fn test_yaml_layout_keeps_column_order() {
        let yaml = serde_yaml::to_string(&sample_report()).unwrap();
        let zeta = yaml.find("zeta:").unwrap();
        let alpha = yaml.find("alpha:").unwrap();
        assert!(zeta < alpha);
        assert!(yaml.contains("ks_statistic: 0.12"));
        assert!(yaml.contains("drift_detected: true"));
        assert!(yaml.contains("note: comparison sample is empty"));
    }

    #[test]
    fn test_write_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("drift_report").join("report.yaml");
        let writer = YamlReportWriter::new(&path);

        writer.write_report(&sample_report()).unwrap();
        let loaded = DriftReport::load(writer.location()).unwrap();

        assert_eq!(loaded, sample_report());
    }

    #[test]
    fn test_write_empty_report() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.yaml");
        write_report(&path, &DriftReport::new()).unwrap();

        let loaded = DriftReport::load(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_write_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_report(&blocker.join("report.yaml"), &sample_report()).unwrap_err();
        assert!(matches!(err, ValidationError::Io { .. }));
    }
}
