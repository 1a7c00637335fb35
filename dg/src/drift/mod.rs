//! Statistical drift detection between dataset partitions
//!
//! - [`ks`] - two-sample Kolmogorov-Smirnov test
//! - [`detector`] - per-column testing and overall status
//! - [`report`] - report types and the writer that persists them

pub mod detector;
pub mod ks;
pub mod report;

pub use detector::{DEFAULT_THRESHOLD, DriftDetector};
pub use ks::{KsMethod, KsResult, ks_2samp};
pub use report::{ColumnDriftResult, DriftReport, ReportWriter, YamlReportWriter, write_report};
