//! Validation stage
//!
//! - [`columns`] - structural column-count check against the schema
//! - [`validator`] - orchestrates column checks, drift detection, and the handoff artifact

pub mod columns;
pub mod validator;

pub use columns::{ColumnCheck, check_columns, validate_columns};
pub use validator::DataValidation;
