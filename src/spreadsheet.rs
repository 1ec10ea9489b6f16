//! Workbook input (`excel` feature)
//!
//! Reads one worksheet of an `.xlsx`/`.xls`/`.ods` workbook with `calamine`
//! and feeds its first row as the header and the remaining rows as records
//! through the same pipeline as delimited text.

use crate::config::ColumnRoles;
use crate::error::{DataResult, LoadError};
use crate::loader::RowAssembler;
use crate::table::Dataset;
use calamine::{open_workbook_auto, Data, Reader};
use std::borrow::Cow;
use std::path::Path;

/// Load `sheet` (or the first worksheet) of the workbook at `path`.
pub(crate) fn read_workbook(
    path: &Path,
    name: &str,
    roles: &ColumnRoles,
    sheet: Option<&str>,
) -> DataResult<Dataset> {
    let mut workbook = open_workbook_auto(path).map_err(LoadError::Spreadsheet)?;
    let available = workbook.sheet_names();
    let sheet = match sheet {
        Some(wanted) if available.iter().any(|s| s == wanted) => wanted.to_string(),
        Some(wanted) => {
            return Err(LoadError::MissingSheet {
                sheet: wanted.to_string(),
                available,
            }
            .into())
        }
        None => available
            .first()
            .cloned()
            .ok_or_else(|| LoadError::Empty(name.to_string()))?,
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(LoadError::Spreadsheet)?;
    log::debug!("reading sheet '{}' of '{}' ({:?} cells)", sheet, name, range.get_size());

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| LoadError::Empty(name.to_string()))?;
    let mut assembler = RowAssembler::new(name, roles, header.iter().map(cell_text))?;
    for row in rows {
        assembler.push(row.iter().map(cell_text))?;
    }
    Ok(assembler.finish())
}

/// Cell as the text a delimited export of the sheet would hold.
fn cell_text(cell: &Data) -> Cow<'_, str> {
    match cell {
        Data::String(s) => Cow::Borrowed(s.as_str()),
        Data::Empty => Cow::Borrowed(""),
        Data::Int(n) => Cow::Owned(n.to_string()),
        Data::Float(v) => Cow::Owned(v.to_string()),
        Data::Bool(b) => Cow::Owned(b.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnValue;
    use crate::error::DataError;
    use crate::loader::{DatasetLoader, Source};
    use rust_xlsxwriter::Workbook;
    use std::path::PathBuf;

    /// Two-sheet workbook; the trees live on the second sheet, as exported
    /// from a French-locale spreadsheet.
    fn write_workbook(dir: &Path) -> PathBuf {
        let path = dir.join("trees.xlsx");
        let mut workbook = Workbook::new();

        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "Urban forest extract").unwrap();

        let trees = workbook.add_worksheet();
        trees.set_name("Feuil1").unwrap();
        for (col, header) in ["Common Name", "Year Planted", "Diameter Breast Height"].iter().enumerate() {
            trees.write_string(0, col as u16, *header).unwrap();
        }
        trees.write_string(1, 0, "Elm").unwrap();
        trees.write_number(1, 1, 1998.0).unwrap();
        trees.write_number(1, 2, 45.5).unwrap();
        trees.write_string(2, 0, "Oak").unwrap();
        trees.write_number(2, 1, 2001.0).unwrap();
        trees.write_number(3, 1, 2005.0).unwrap();

        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_configured_sheet_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(dir.path());

        let mut loader = DatasetLoader::new(ColumnRoles::default()).with_sheet(Some("Feuil1".into()));
        let dataset = loader.load(&Source::path(&path)).unwrap();

        assert_eq!(
            dataset.schema().column_names(),
            vec!["common_name", "year_planted", "diameter_breast_height"]
        );
        // third data row has no category
        assert_eq!(dataset.len(), 2);
        let elm = dataset.row(0).unwrap();
        assert_eq!(elm.year(), Some(1998));
        assert_eq!(elm.get("diameter_breast_height"), Some(&ColumnValue::Float(45.5)));
        assert!(dataset.row(1).unwrap().get("diameter_breast_height").unwrap().is_null());
    }

    #[test]
    fn test_first_sheet_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(dir.path());

        let mut loader = DatasetLoader::new(ColumnRoles::default());
        let err = loader.load(&Source::path(&path)).unwrap_err();
        assert!(matches!(err, DataError::Schema(_)));
    }

    #[test]
    fn test_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(dir.path());

        let mut loader = DatasetLoader::new(ColumnRoles::default()).with_sheet(Some("Sheet9".into()));
        let err = loader.load(&Source::path(&path)).unwrap_err();
        assert!(matches!(
            err,
            DataError::Load(LoadError::MissingSheet { ref sheet, ref available })
                if sheet == "Sheet9" && available == &["Notes", "Feuil1"]
        ));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(1998.0)), "1998");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("Elm".into())), "Elm");
    }
}
