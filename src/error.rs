//! Error types for loading, schema validation and export
//!
//! Only two conditions are fatal to a session: the source cannot be read or
//! parsed at all ([`LoadError`]), or a required column is missing after header
//! normalization ([`SchemaError`]). Uncoercible cells become nulls and empty
//! filter/search results are ordinary empty collections, so neither has an
//! error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The source could not be located, read or parsed.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File missing or unreadable
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited text could not be parsed
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// No header row
    #[error("source '{0}' is empty")]
    Empty(String),

    /// Workbook given but the `excel` feature is disabled
    #[error("unsupported source format '.{extension}' (enable the `excel` feature or export to delimited text)")]
    UnsupportedFormat { extension: String },

    /// The configured worksheet is not in the workbook
    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    /// Workbook could not be opened or read
    #[cfg(feature = "excel")]
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
}

/// The parsed table does not satisfy the declared column roles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A required column is absent after normalization
    #[error("required column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// Two headers normalize to the same identifier
    #[error("duplicate column '{column}' after normalization")]
    DuplicateColumn { column: String },

    /// A column was used in a role its semantic type does not support
    #[error("column '{column}' is not numeric")]
    NotNumeric { column: String },
}

/// Umbrella error for all fallible operations in the crate
#[derive(Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Unrecognized or malformed configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A row does not match the dataset schema
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// Serializing a table failed
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),

    /// File system error outside of loading (config files, export targets)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for data operations
pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_lists_available() {
        let err = SchemaError::MissingColumn {
            column: "year_planted".to_string(),
            available: vec!["common_name".to_string(), "genus".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "required column 'year_planted' not found (available: common_name, genus)"
        );
    }

    #[test]
    fn test_schema_error_converts_to_data_error() {
        let err: DataError = SchemaError::DuplicateColumn { column: "genus".to_string() }.into();
        assert!(matches!(err, DataError::Schema(SchemaError::DuplicateColumn { .. })));
        assert_eq!(err.to_string(), "duplicate column 'genus' after normalization");
    }
}
