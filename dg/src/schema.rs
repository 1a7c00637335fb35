//! Expected column schema loaded from a YAML definition
//!
//! Two layouts are accepted for `columns`: a list of single-entry maps (the
//! layout written by most schema exporters) or a plain mapping.
//!
//! ```yaml
//! columns:
//!   - having_IP_Address: int64
//!   - URL_Length: int64
//! numerical_columns:
//!   - having_IP_Address
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ValidationError;

/// One declared column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// Type descriptor as written in the schema file (e.g. `int64`)
    pub dtype: String,
}

/// Ordered column name -> type descriptor mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDefinition {
    columns: Vec<ColumnSpec>,
    numerical_columns: Vec<String>,
}

#[derive(Deserialize)]
struct RawSchema {
    columns: RawColumns,
    #[serde(default)]
    numerical_columns: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawColumns {
    List(Vec<serde_yaml::Mapping>),
    Map(serde_yaml::Mapping),
}

impl SchemaDefinition {
    /// Load a schema definition from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        debug!(?path, "SchemaDefinition::load: called");

        let content = fs::read_to_string(path).map_err(|e| ValidationError::config(path, e))?;
        let schema = Self::parse(&content).map_err(|message| ValidationError::config(path, message))?;

        info!(
            path = %path.display(),
            columns = schema.len(),
            "Loaded schema definition"
        );
        Ok(schema)
    }

    /// Parse schema YAML; the error is a human-readable reason
    pub fn parse(content: &str) -> Result<Self, String> {
        let raw: RawSchema = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

        let entries: Vec<(serde_yaml::Value, serde_yaml::Value)> = match raw.columns {
            RawColumns::List(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for item in items {
                    if item.len() != 1 {
                        return Err(format!(
                            "each entry in `columns` must map one column to its type, found {} keys",
                            item.len()
                        ));
                    }
                    entries.extend(item);
                }
                entries
            }
            RawColumns::Map(map) => map.into_iter().collect(),
        };

        let mut columns: Vec<ColumnSpec> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let name = scalar_to_string(&key).ok_or_else(|| "column names must be scalars".to_string())?;
            let dtype = scalar_to_string(&value).ok_or_else(|| format!("type of column `{}` must be a scalar", name))?;
            if columns.iter().any(|c| c.name == name) {
                return Err(format!("column `{}` is declared twice", name));
            }
            columns.push(ColumnSpec { name, dtype });
        }

        for name in &raw.numerical_columns {
            if !columns.iter().any(|c| &c.name == name) {
                return Err(format!("numerical column `{}` is not declared in `columns`", name));
            }
        }

        Ok(Self {
            columns,
            numerical_columns: raw.numerical_columns,
        })
    }

    /// Number of declared columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up the declared type of a column
    pub fn dtype_of(&self, name: &str) -> Option<&str> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.dtype.as_str())
    }

    pub fn numerical_columns(&self) -> &[String] {
        &self.numerical_columns
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
