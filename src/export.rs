//! Export of any table (dataset or filtered view) to delimited UTF-8 text.
//!
//! Output has a header row in schema order and no row-index column. Nulls are
//! written as empty cells and numbers in their shortest round-trip form, so
//! re-parsing with the loader under the same column roles reproduces the table.

use crate::error::DataResult;
use crate::table::Tabular;
use std::path::Path;

pub struct ExportService;

impl ExportService {
    /// Serialize `table` as comma-delimited bytes.
    ///
    /// ```
    /// use canopy::{parse_delimited, ColumnRoles, ExportService};
    ///
    /// let roles = ColumnRoles::new("species", "year");
    /// let dataset = parse_delimited(b"Species,Year\n\"Elm, English\",1998\n", "t", &roles, b',').unwrap();
    /// let bytes = ExportService::serialize(&dataset).unwrap();
    /// assert_eq!(String::from_utf8(bytes).unwrap(), "species,year\n\"Elm, English\",1998\n");
    /// ```
    pub fn serialize(table: &dyn Tabular) -> DataResult<Vec<u8>> {
        Self::serialize_with(table, b',')
    }

    pub fn serialize_with(table: &dyn Tabular, delimiter: u8) -> DataResult<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        writer.write_record(table.schema().column_names())?;
        for record in table.records() {
            writer.write_record(record.values().map(|v| v.to_string()))?;
        }
        writer.flush()?;

        let bytes = writer
            .into_inner()
            .map_err(|e| crate::error::DataError::Io(e.into_error()))?;
        log::debug!("serialized {} rows ({} bytes)", table.row_count(), bytes.len());
        Ok(bytes)
    }

    /// Write one export file for `table` at `path`.
    pub fn write_to(table: &dyn Tabular, path: impl AsRef<Path>) -> DataResult<()> {
        let bytes = Self::serialize(table)?;
        std::fs::write(path.as_ref(), bytes)?;
        log::info!("exported {} rows to {}", table.row_count(), path.as_ref().display());
        Ok(())
    }
}
