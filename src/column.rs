/// Canopy Column Implementation
///
/// A Column is an immutable, index-addressed run of cells sharing one semantic
/// type. Raw text cells are coerced into typed values when a dataset is
/// loaded; cells that fail coercion are stored as `Null` rather than rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// String-valued grouping dimension (species, suburb, property type)
    Category,
    /// Measured quantity (height, diameter, price)
    Continuous,
    /// Integer year
    Year,
    Latitude,
    Longitude,
    /// Any other column, carried through untouched
    Text,
}

impl SemanticType {
    /// Returns true for columns whose cells are coerced to numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Continuous
                | SemanticType::Year
                | SemanticType::Latitude
                | SemanticType::Longitude
        )
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Text(String),
    Int(i64),
    Float(f64),
    Null,
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the cell; integers widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int(v) => Some(*v as f64),
            ColumnValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Coerce a raw text cell according to the column's semantic type.
    ///
    /// Blank cells and values that fail numeric coercion become `Null`.
    ///
    /// ```
    /// use canopy::{ColumnValue, SemanticType};
    ///
    /// assert_eq!(ColumnValue::coerce(" 1998 ", SemanticType::Year), ColumnValue::Int(1998));
    /// assert_eq!(ColumnValue::coerce("1998.0", SemanticType::Year), ColumnValue::Int(1998));
    /// assert_eq!(ColumnValue::coerce("unknown", SemanticType::Continuous), ColumnValue::Null);
    /// assert_eq!(ColumnValue::coerce("Elm", SemanticType::Category), ColumnValue::Text("Elm".into()));
    /// ```
    pub fn coerce(raw: &str, semantic_type: SemanticType) -> ColumnValue {
        let raw = raw.trim();
        if raw.is_empty() {
            return ColumnValue::Null;
        }

        match semantic_type {
            SemanticType::Category | SemanticType::Text => ColumnValue::Text(raw.to_string()),
            SemanticType::Year => coerce_year(raw),
            SemanticType::Continuous | SemanticType::Latitude | SemanticType::Longitude => {
                match raw.parse::<f64>() {
                    Ok(v) if v.is_finite() => ColumnValue::Float(v),
                    _ => ColumnValue::Null,
                }
            }
        }
    }
}

impl fmt::Display for ColumnValue {
    /// Cell text as written to delimited output. Nulls render empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Text(s) => f.write_str(s),
            ColumnValue::Int(n) => write!(f, "{}", n),
            ColumnValue::Float(v) => write!(f, "{}", v),
            ColumnValue::Null => Ok(()),
        }
    }
}

/// Years written as whole floats ("1998.0") are accepted; fractional years are not.
fn coerce_year(raw: &str) -> ColumnValue {
    if let Ok(year) = raw.parse::<i64>() {
        return ColumnValue::Int(year);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            ColumnValue::Int(v as i64)
        }
        _ => ColumnValue::Null,
    }
}

/// Typed column storage.
pub struct Column {
    name: String,
    semantic_type: SemanticType,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: String, semantic_type: SemanticType) -> Self {
        Self::with_capacity(name, semantic_type, 0)
    }

    pub fn with_capacity(name: String, semantic_type: SemanticType, capacity: usize) -> Self {
        Column {
            name,
            semantic_type,
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    /// Fast numeric access for filtering and aggregation.
    /// Returns None if the cell is null, non-numeric or out of bounds.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(ColumnValue::as_f64)
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        self.values.get(index).map_or(true, ColumnValue::is_null)
    }

    /// Values are appended only while a dataset is being built.
    pub(crate) fn append(&mut self, value: ColumnValue) {
        self.values.push(value);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnValue> {
        self.values.iter()
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("semantic_type", &self.semantic_type)
            .field("len", &self.values.len())
            .finish()
    }
}
