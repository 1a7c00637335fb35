//! CSV-backed tabular datasets
//!
//! Thin helpers over `polars` frames: reading and writing CSV partitions,
//! deciding which columns are numeric, and pulling numeric samples out of a
//! column for the distribution tests.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::error::ValidationError;
use crate::schema::SchemaDefinition;

/// Read a CSV file with a header row
///
/// Every cell equal to one of `null_values` is read as null. Column types are
/// inferred from the whole file.
pub fn read_csv(path: &Path, null_values: &[String]) -> Result<DataFrame, ValidationError> {
    debug!(?path, "read_csv: called");
    let file = File::open(path).map_err(|e| ValidationError::io(path, e))?;

    let mut parse_options = CsvParseOptions::default();
    if !null_values.is_empty() {
        let tokens: Vec<PlSmallStr> = null_values.iter().map(|v| v.as_str().into()).collect();
        parse_options = parse_options.with_null_values(Some(NullValues::AllColumns(tokens)));
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| ValidationError::data(path, e))?;

    debug!(?path, rows = frame.height(), columns = frame.width(), "read_csv: loaded");
    Ok(frame)
}

/// Write a frame as CSV with a header row, creating parent directories
pub fn write_csv(path: &Path, frame: &mut DataFrame) -> Result<(), ValidationError> {
    debug!(?path, rows = frame.height(), "write_csv: called");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ValidationError::io(parent, e))?;
    }

    let mut file = File::create(path).map_err(|e| ValidationError::io(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .map_err(|e| ValidationError::data(path, e))
}

/// Whether values of this type take part in numeric distribution tests
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Column names in frame order
pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame.get_column_names().into_iter().map(|name| name.to_string()).collect()
}

/// Names of the numeric columns, in frame order
pub fn numeric_columns(frame: &DataFrame) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .filter(|column| is_numeric(column.dtype()))
        .map(|column| column.name().to_string())
        .collect()
}

/// Polars type for a schema type descriptor, for the numeric descriptors only
pub fn numeric_dtype(descriptor: &str) -> Option<DataType> {
    match descriptor.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => Some(DataType::Boolean),
        "int8" => Some(DataType::Int8),
        "int16" => Some(DataType::Int16),
        "int32" => Some(DataType::Int32),
        "int" | "int64" => Some(DataType::Int64),
        "uint8" => Some(DataType::UInt8),
        "uint16" => Some(DataType::UInt16),
        "uint32" => Some(DataType::UInt32),
        "uint64" => Some(DataType::UInt64),
        "float32" => Some(DataType::Float32),
        "float" | "float64" => Some(DataType::Float64),
        _ => None,
    }
}

/// True when the column carries no values, so its inferred type says nothing
fn is_all_null(column: &Column) -> bool {
    column.null_count() == column.len()
}

/// Give all-null columns the numeric type the schema declares for them
///
/// CSV inference reads a column with no values (every cell a null token, or a
/// header-only file) as text. Columns that do hold values keep their inferred
/// type.
pub fn conform_to_schema(frame: &mut DataFrame, schema: &SchemaDefinition) -> PolarsResult<()> {
    for spec in schema.columns() {
        let Some(dtype) = numeric_dtype(&spec.dtype) else {
            continue;
        };
        let Ok(column) = frame.column(&spec.name) else {
            continue;
        };
        if is_numeric(column.dtype()) || !is_all_null(column) {
            continue;
        }

        debug!(column = %spec.name, %dtype, "conform_to_schema: casting all-null column");
        let cast = column.cast(&dtype)?;
        frame.with_column(cast)?;
    }
    Ok(())
}

/// Non-missing values of a numeric column as `f64`
///
/// Nulls and NaNs are dropped. A column with no values at all is an empty
/// sample whatever type it was read as. Fails when the column holds
/// non-numeric values.
pub fn numeric_values(column: &Column) -> Result<Vec<f64>, ValidationError> {
    if is_all_null(column) {
        return Ok(Vec::new());
    }
    if !is_numeric(column.dtype()) {
        return Err(ValidationError::StatisticalTest(format!(
            "column `{}` has non-numeric type {}",
            column.name(),
            column.dtype()
        )));
    }

    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ValidationError::StatisticalTest(format!("column `{}`: {}", column.name(), e)))?;
    let values = series
        .f64()
        .map_err(|e| ValidationError::StatisticalTest(format!("column `{}`: {}", column.name(), e)))?;

    Ok(values.into_iter().flatten().filter(|v| !v.is_nan()).collect())
}

/// Split rows into those with a value in every column and those with a null
pub fn split_complete_rows(frame: &DataFrame) -> PolarsResult<(DataFrame, DataFrame)> {
    let mut complete = BooleanChunked::full("complete".into(), true, frame.height());
    for column in frame.get_columns() {
        complete = &complete & &column.is_not_null();
    }
    let incomplete = !&complete;

    Ok((frame.filter(&complete)?, frame.filter(&incomplete)?))
}

/// Gather rows by position
pub fn take_rows(frame: &DataFrame, rows: &[usize]) -> PolarsResult<DataFrame> {
    let indices: Vec<IdxSize> = rows.iter().map(|&r| r as IdxSize).collect();
    frame.take(&IdxCa::from_vec("rows".into(), indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_numeric_columns_excludes_text() {
        let frame = df!(
            "a" => [1i64, 2, 3],
            "b" => ["x", "y", "z"],
            "c" => [0.5f64, 1.5, 2.5],
            "d" => [true, false, true]
        )
        .unwrap();

        assert_eq!(numeric_columns(&frame), vec!["a", "c", "d"]);
        assert_eq!(column_names(&frame), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_numeric_values_drops_missing() {
        let frame = df!("x" => [Some(1.0f64), None, Some(f64::NAN), Some(4.0)]).unwrap();
        let values = numeric_values(frame.column("x").unwrap()).unwrap();
        assert_eq!(values, vec![1.0, 4.0]);
    }

    #[test]
    fn test_numeric_values_rejects_text() {
        let frame = df!("x" => ["a", "b"]).unwrap();
        let err = numeric_values(frame.column("x").unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::StatisticalTest(_)));
    }

    #[test]
    fn test_csv_round_trip_preserves_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("data.csv");
        let mut frame = df!("b" => [3i64, 1, 2], "a" => ["p", "q", "r"]).unwrap();

        write_csv(&path, &mut frame).unwrap();
        let read = read_csv(&path, &[]).unwrap();

        assert_eq!(column_names(&read), vec!["b", "a"]);
        assert!(read.equals(&frame));
    }

    #[test]
    fn test_read_csv_null_tokens() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.csv");
        fs::write(&path, "x,y\n1,na\n2,3\n").unwrap();

        let frame = read_csv(&path, &["na".to_string()]).unwrap();
        assert!(is_numeric(frame.column("y").unwrap().dtype()));
        assert_eq!(frame.column("y").unwrap().null_count(), 1);
    }

    #[test]
    fn test_numeric_values_all_null_text_is_empty() {
        let frame = df!("x" => [None::<&str>, None]).unwrap();
        assert!(numeric_values(frame.column("x").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_conform_to_schema_types_empty_columns() {
        let temp = TempDir::new().unwrap();
        let schema = SchemaDefinition::parse("columns:\n  - x: int64\n  - y: float64\n  - label: object\n").unwrap();

        let nulls = temp.path().join("nulls.csv");
        fs::write(&nulls, "x,y,label\nna,1.5,a\nna,2.5,na\n").unwrap();
        let mut frame = read_csv(&nulls, &["na".to_string()]).unwrap();
        assert_eq!(frame.column("x").unwrap().dtype(), &DataType::String);

        conform_to_schema(&mut frame, &schema).unwrap();
        assert_eq!(frame.column("x").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("y").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("label").unwrap().dtype(), &DataType::String);
        assert_eq!(column_names(&frame), vec!["x", "y", "label"]);

        let header_only = temp.path().join("header.csv");
        fs::write(&header_only, "x,y,label\n").unwrap();
        let mut frame = read_csv(&header_only, &[]).unwrap();
        conform_to_schema(&mut frame, &schema).unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(numeric_columns(&frame), vec!["x", "y"]);
    }

    #[test]
    fn test_conform_to_schema_keeps_columns_with_values() {
        let schema = SchemaDefinition::parse("columns:\n  - x: int64\n  - extra: int64\n").unwrap();
        let mut frame = df!("x" => ["a", "b"]).unwrap();
        conform_to_schema(&mut frame, &schema).unwrap();
        assert_eq!(frame.column("x").unwrap().dtype(), &DataType::String);
        assert!(frame.column("extra").is_err());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = read_csv(&temp.path().join("missing.csv"), &[]).unwrap_err();
        assert!(matches!(err, ValidationError::Io { .. }));
    }

    #[test]
    fn test_split_complete_rows() {
        let frame = df!("a" => [Some(1i64), None, Some(3)], "b" => [Some("x"), Some("y"), None]).unwrap();
        let (complete, incomplete) = split_complete_rows(&frame).unwrap();
        assert_eq!(complete.height(), 1);
        assert_eq!(incomplete.height(), 2);
    }

    #[test]
    fn test_take_rows() {
        let frame = df!("a" => [10i64, 20, 30]).unwrap();
        let taken = take_rows(&frame, &[2, 0]).unwrap();
        let values: Vec<Option<i64>> = taken
            .column("a")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(30), Some(10)]);
    }
}
