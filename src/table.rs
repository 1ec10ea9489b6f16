/// Canopy Dataset Implementation
///
/// A Dataset is an ordered collection of records stored column-wise under a
/// normalized schema. Datasets are built once by the loader and are immutable
/// afterwards; every derived structure (category index, filtered views,
/// aggregates) reads from a shared `Rc<Dataset>`.
///
/// # Examples
///
/// ```
/// use canopy::{ColumnValue, Dataset, Schema, SemanticType};
///
/// let schema = Schema::new(vec![
///     ("Common Name".to_string(), SemanticType::Category),
///     ("Year Planted".to_string(), SemanticType::Year),
/// ]);
/// let mut dataset = Dataset::new("trees", schema, "common name", "year planted").unwrap();
/// dataset
///     .append_row(vec![ColumnValue::Text("Elm".into()), ColumnValue::Int(1998)])
///     .unwrap();
///
/// assert_eq!(dataset.schema().column_names(), vec!["common_name", "year_planted"]);
/// assert_eq!(dataset.row(0).unwrap().category(), "Elm");
/// ```

use crate::column::{Column, ColumnValue, SemanticType};
use crate::error::{DataError, DataResult, SchemaError};

static NULL: ColumnValue = ColumnValue::Null;

/// Normalize a column identifier: trim, collapse interior whitespace into a
/// single `_`, lower-case.
///
/// ```
/// assert_eq!(canopy::normalize_identifier("  Diameter Breast  Height "), "diameter_breast_height");
/// ```
pub fn normalize_identifier(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Schema definition: normalized column names with their semantic types, in
/// source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, SemanticType)>,
}

impl Schema {
    /// Creates a schema, normalizing every column name.
    pub fn new(columns: Vec<(String, SemanticType)>) -> Self {
        Schema {
            columns: columns
                .into_iter()
                .map(|(name, ty)| (normalize_identifier(&name), ty))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Index of a column. The lookup name is normalized first, so
    /// "Common Name" finds `common_name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = normalize_identifier(name);
        self.columns.iter().position(|(n, _)| *n == name)
    }

    pub fn column_type(&self, name: &str) -> Option<SemanticType> {
        self.column_index(name).map(|i| self.columns[i].1)
    }

    /// Returns (name, type) for the column at `index`.
    pub fn column_info(&self, index: usize) -> Option<(&str, SemanticType)> {
        self.columns.get(index).map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Names of all columns with the given semantic type, in schema order.
    pub fn columns_of_type(&self, semantic_type: SemanticType) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, ty)| *ty == semantic_type)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn first_duplicate(&self) -> Option<&str> {
        self.columns.iter().enumerate().find_map(|(i, (name, _))| {
            self.columns[..i]
                .iter()
                .any(|(other, _)| other == name)
                .then_some(name.as_str())
        })
    }

    fn require(&self, name: &str) -> Result<usize, SchemaError> {
        self.column_index(name).ok_or_else(|| SchemaError::MissingColumn {
            column: normalize_identifier(name),
            available: self.column_names().iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Immutable table of records.
pub struct Dataset {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
    category_column: usize,
    year_column: usize,
}

impl Dataset {
    /// Create an empty dataset whose primary category and year columns are
    /// `category` and `year`.
    ///
    /// Fails with `SchemaError` when either column is missing or when two
    /// columns share a normalized name.
    pub fn new(name: &str, schema: Schema, category: &str, year: &str) -> Result<Self, SchemaError> {
        if let Some(dup) = schema.first_duplicate() {
            return Err(SchemaError::DuplicateColumn { column: dup.to_string() });
        }
        let category_column = schema.require(category)?;
        let year_column = schema.require(year)?;

        let columns = schema
            .columns
            .iter()
            .map(|(col_name, ty)| Column::new(col_name.clone(), *ty))
            .collect();

        Ok(Dataset {
            name: name.to_string(),
            schema,
            columns,
            row_count: 0,
            category_column,
            year_column,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Name of the primary category column.
    pub fn category_column(&self) -> &str {
        self.columns[self.category_column].name()
    }

    /// Name of the ordinal-year column.
    pub fn year_column(&self) -> &str {
        self.columns[self.year_column].name()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.column_index(name).map(|i| &self.columns[i])
    }

    pub(crate) fn column_at(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn row(&self, index: usize) -> Option<Record<'_>> {
        (index < self.row_count).then_some(Record { dataset: self, index })
    }

    pub fn iter(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.row_count).map(move |index| Record { dataset: self, index })
    }

    /// Append one row in schema order.
    ///
    /// The category and year cells are required; rows lacking either are
    /// rejected so the dataset never holds a record without them.
    pub fn append_row(&mut self, row: Vec<ColumnValue>) -> DataResult<()> {
        if row.len() != self.columns.len() {
            return Err(DataError::InvalidRow(format!(
                "expected {} values, got {}",
                self.columns.len(),
                row.len()
            )));
        }
        if row[self.category_column].as_str().is_none() {
            return Err(DataError::InvalidRow(format!(
                "missing category value for '{}'",
                self.category_column()
            )));
        }
        if row[self.year_column].as_i64().is_none() {
            return Err(DataError::InvalidRow(format!(
                "missing year value for '{}'",
                self.year_column()
            )));
        }

        for (col, value) in self.columns.iter_mut().zip(row) {
            col.append(value);
        }
        self.row_count += 1;
        Ok(())
    }

    /// Smallest and largest non-null value of a numeric column, or None when
    /// the column is unknown or has no numeric values. Callers use this to seed
    /// default range bounds.
    pub fn numeric_bounds(&self, column: &str) -> Option<(f64, f64)> {
        let col = self.column(column)?;
        col.iter()
            .filter_map(ColumnValue::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("rows", &self.row_count)
            .finish()
    }
}

/// Borrowed view of one dataset row.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> Record<'a> {
    /// Position of this record in its dataset.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a ColumnValue> {
        self.dataset.column(column).and_then(|c| c.get(self.index))
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.dataset.column(column).and_then(|c| c.get_f64(self.index))
    }

    /// Primary category value. Always present for loaded records.
    pub fn category(&self) -> &'a str {
        self.dataset
            .column_at(self.dataset.category_column)
            .get(self.index)
            .and_then(ColumnValue::as_str)
            .unwrap_or_default()
    }

    pub fn year(&self) -> Option<i64> {
        self.dataset
            .column_at(self.dataset.year_column)
            .get(self.index)
            .and_then(ColumnValue::as_i64)
    }

    /// (latitude, longitude) when the dataset declares a geo pair and both
    /// cells are present.
    pub fn geo(&self) -> Option<(f64, f64)> {
        let schema = self.dataset.schema();
        let lat = schema.columns_of_type(SemanticType::Latitude).first().copied()?;
        let lon = schema.columns_of_type(SemanticType::Longitude).first().copied()?;
        Some((self.get_f64(lat)?, self.get_f64(lon)?))
    }

    /// Cells in schema order.
    pub fn values(&self) -> impl Iterator<Item = &'a ColumnValue> + 'a {
        let index = self.index;
        self.dataset
            .columns
            .iter()
            .map(move |c| c.get(index).unwrap_or(&NULL))
    }
}

impl std::fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}

/// Anything exportable as a table: a schema plus an ordered run of records.
pub trait Tabular {
    fn schema(&self) -> &Schema;

    fn row_count(&self) -> usize;

    fn records(&self) -> Box<dyn Iterator<Item = Record<'_>> + '_>;
}

impl Tabular for Dataset {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn records(&self) -> Box<dyn Iterator<Item = Record<'_>> + '_> {
        Box::new(self.iter())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Trees dataset used across module tests: category, year, height and a geo pair.
    pub(crate) fn sample_dataset(rows: &[(&str, i64, Option<f64>)]) -> Dataset {
        let schema = Schema::new(vec![
            ("common_name".to_string(), SemanticType::Category),
            ("year_planted".to_string(), SemanticType::Year),
            ("height".to_string(), SemanticType::Continuous),
            ("latitude".to_string(), SemanticType::Latitude),
            ("longitude".to_string(), SemanticType::Longitude),
        ]);
        let mut dataset = Dataset::new("trees", schema, "common_name", "year_planted").unwrap();
        for (i, (name, year, height)) in rows.iter().enumerate() {
            dataset
                .append_row(vec![
                    ColumnValue::Text(name.to_string()),
                    ColumnValue::Int(*year),
                    height.map_or(ColumnValue::Null, ColumnValue::Float),
                    ColumnValue::Float(-37.8 - i as f64 / 100.0),
                    ColumnValue::Float(144.9),
                ])
                .unwrap();
        }
        dataset
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("Common Name"), "common_name");
        assert_eq!(normalize_identifier("  Year\tPlanted  "), "year_planted");
        assert_eq!(normalize_identifier("CoM ID"), "com_id");
        assert_eq!(normalize_identifier("latitude"), "latitude");
    }

    #[test]
    fn test_schema_lookup_normalizes() {
        let schema = Schema::new(vec![
            ("Common Name".to_string(), SemanticType::Category),
            ("Height".to_string(), SemanticType::Continuous),
        ]);
        assert_eq!(schema.column_index("common name"), Some(0));
        assert_eq!(schema.column_index("HEIGHT"), Some(1));
        assert_eq!(schema.column_type("height"), Some(SemanticType::Continuous));
        assert_eq!(schema.columns_of_type(SemanticType::Continuous), vec!["height"]);
    }

    #[test]
    fn test_missing_required_column() {
        let schema = Schema::new(vec![("common_name".to_string(), SemanticType::Category)]);
        let err = Dataset::new("t", schema, "common_name", "year_planted").unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                column: "year_planted".to_string(),
                available: vec!["common_name".to_string()],
            }
        );
    }

    #[test]
    fn test_duplicate_after_normalization() {
        let schema = Schema::new(vec![
            ("Common Name".to_string(), SemanticType::Category),
            ("common  name".to_string(), SemanticType::Text),
            ("year".to_string(), SemanticType::Year),
        ]);
        let err = Dataset::new("t", schema, "common_name", "year").unwrap_err();
        assert_eq!(err, SchemaError::DuplicateColumn { column: "common_name".to_string() });
    }

    #[test]
    fn test_append_row_rejects_missing_required() {
        let mut dataset = sample_dataset(&[]);
        let result = dataset.append_row(vec![
            ColumnValue::Null,
            ColumnValue::Int(2000),
            ColumnValue::Null,
            ColumnValue::Null,
            ColumnValue::Null,
        ]);
        assert!(matches!(result, Err(DataError::InvalidRow(_))));

        let result = dataset.append_row(vec![ColumnValue::Text("Elm".into())]);
        assert!(matches!(result, Err(DataError::InvalidRow(_))));
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_record_accessors() {
        let dataset = sample_dataset(&[("Elm", 1990, Some(12.0)), ("Oak", 2001, None)]);
        let elm = dataset.row(0).unwrap();
        assert_eq!(elm.category(), "Elm");
        assert_eq!(elm.year(), Some(1990));
        assert_eq!(elm.get_f64("height"), Some(12.0));
        assert_eq!(elm.geo(), Some((-37.8, 144.9)));

        let oak = dataset.row(1).unwrap();
        assert_eq!(oak.get("height"), Some(&ColumnValue::Null));
        assert!(dataset.row(2).is_none());
    }

    #[test]
    fn test_numeric_bounds_skip_nulls() {
        let dataset = sample_dataset(&[
            ("Elm", 1990, Some(12.0)),
            ("Oak", 2001, None),
            ("Pine", 1985, Some(3.5)),
        ]);
        assert_eq!(dataset.numeric_bounds("height"), Some((3.5, 12.0)));
        assert_eq!(dataset.numeric_bounds("year_planted"), Some((1985.0, 2001.0)));
        assert_eq!(dataset.numeric_bounds("common_name"), None);
        assert_eq!(dataset.numeric_bounds("missing"), None);
    }
}
