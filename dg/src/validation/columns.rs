//! Structural column check against the schema
//!
//! Only the column count is compared. Names and types are not checked.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::schema::SchemaDefinition;

/// Result of comparing one dataset's column count to the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCheck {
    /// Which partition was checked (e.g. "train")
    pub dataset: String,
    pub expected: usize,
    pub actual: usize,
}

impl ColumnCheck {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }

    /// Human-readable reason, present only on mismatch
    pub fn diagnostic(&self) -> Option<String> {
        if self.passed() {
            None
        } else {
            Some(format!(
                "{} dataframe has {} columns, schema requires {}",
                self.dataset, self.actual, self.expected
            ))
        }
    }
}

/// True iff the frame has exactly as many columns as the schema declares
pub fn validate_columns(frame: &DataFrame, schema: &SchemaDefinition) -> bool {
    check_columns("dataframe", frame, schema).passed()
}

/// Compare column counts and keep the numbers for reporting
pub fn check_columns(dataset: &str, frame: &DataFrame, schema: &SchemaDefinition) -> ColumnCheck {
    debug!(dataset, "check_columns: called");
    let check = ColumnCheck {
        dataset: dataset.to_string(),
        expected: schema.len(),
        actual: frame.width(),
    };
    info!(dataset, "Required number of columns: {}", check.expected);
    info!(dataset, "Dataframe has columns: {}", check.actual);
    check
}
