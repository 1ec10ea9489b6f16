//! Explorer configuration
//!
//! A closed record of recognized options. Configuration is read from JSON and
//! any unrecognized key is rejected with [`DataError::Config`] instead of being
//! carried along as an arbitrary attribute.

use crate::error::{DataError, DataResult};
use crate::table::normalize_identifier;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of index values selected when a session starts.
pub const DEFAULT_SELECTION_SIZE: usize = 5;

/// Rows shown in the filtered-table preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// File name used when exporting the filtered view.
pub const DEFAULT_EXPORT_FILE: &str = "filtered_trees.csv";

/// Which columns play which role. Names are matched after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnRoles {
    /// Primary grouping/filter column (required in the source)
    pub category: String,
    /// Ordinal-year column (required in the source)
    pub year: String,
    /// Continuous numeric columns summarized by mean
    pub continuous: Vec<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// Additional categorical columns, kept as categories but not used for grouping
    pub extra_categories: Vec<String>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        ColumnRoles {
            category: "common_name".to_string(),
            year: "year_planted".to_string(),
            continuous: vec!["diameter_breast_height".to_string()],
            latitude: Some("latitude".to_string()),
            longitude: Some("longitude".to_string()),
            extra_categories: Vec::new(),
        }
    }
}

impl ColumnRoles {
    /// Roles for a category and year column with no optional columns.
    pub fn new(category: &str, year: &str) -> Self {
        ColumnRoles {
            category: category.to_string(),
            year: year.to_string(),
            continuous: Vec::new(),
            latitude: None,
            longitude: None,
            extra_categories: Vec::new(),
        }
    }

    pub fn with_continuous(mut self, column: &str) -> Self {
        self.continuous.push(column.to_string());
        self
    }

    pub fn with_geo(mut self, latitude: &str, longitude: &str) -> Self {
        self.latitude = Some(latitude.to_string());
        self.longitude = Some(longitude.to_string());
        self
    }

    pub fn with_extra_category(mut self, column: &str) -> Self {
        self.extra_categories.push(column.to_string());
        self
    }

    /// Copy with every column name normalized the way headers are.
    pub fn normalized(&self) -> Self {
        let norm = |names: &[String]| -> Vec<String> {
            names.iter().map(|n| normalize_identifier(n)).collect()
        };
        ColumnRoles {
            category: normalize_identifier(&self.category),
            year: normalize_identifier(&self.year),
            continuous: norm(&self.continuous),
            latitude: self.latitude.as_deref().map(normalize_identifier),
            longitude: self.longitude.as_deref().map(normalize_identifier),
            extra_categories: norm(&self.extra_categories),
        }
    }
}

/// Initial selection policy when a category index is first built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultSelection {
    /// The first `k` index values in ascending order
    FirstK { k: usize },
    /// Every index value
    All,
}

impl Default for DefaultSelection {
    fn default() -> Self {
        DefaultSelection::FirstK { k: DEFAULT_SELECTION_SIZE }
    }
}

/// Denominator used for category percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentBase {
    /// Size of the filtered view; percentages sum to 100
    #[default]
    Filtered,
    /// Size of the whole loaded dataset
    Dataset,
}

/// Chart style used by the rendering surface. Has no effect on the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Bar,
    Pie,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    pub columns: ColumnRoles,
    pub default_selection: DefaultSelection,
    pub percent_base: PercentBase,
    /// Whether renderers show percentages next to counts
    pub show_percent: bool,
    pub chart: ChartKind,
    pub preview_rows: usize,
    /// Overrides delimiter detection
    pub delimiter: Option<char>,
    /// Worksheet read from workbook sources; the first sheet when unset
    pub sheet: Option<String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            columns: ColumnRoles::default(),
            default_selection: DefaultSelection::default(),
            percent_base: PercentBase::default(),
            show_percent: true,
            chart: ChartKind::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            delimiter: None,
            sheet: None,
        }
    }
}

impl ExplorerConfig {
    /// Parse a JSON configuration. Missing keys take their defaults.
    ///
    /// ```
    /// use canopy::{ExplorerConfig, PercentBase};
    ///
    /// let config = ExplorerConfig::from_json_str(r#"{"percent_base": "dataset"}"#).unwrap();
    /// assert_eq!(config.percent_base, PercentBase::Dataset);
    /// assert!(ExplorerConfig::from_json_str(r#"{"colour": "green"}"#).is_err());
    /// ```
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        let config: ExplorerConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> DataResult<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(DataError::Io)?;
        Self::from_json_str(&json)
    }

    pub fn with_columns(mut self, columns: ColumnRoles) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_default_selection(mut self, policy: DefaultSelection) -> Self {
        self.default_selection = policy;
        self
    }

    pub fn with_percent_base(mut self, base: PercentBase) -> Self {
        self.percent_base = base;
        self
    }

    /// Delimiter as a single byte, if one is configured and is ASCII.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.filter(char::is_ascii).map(|c| c as u8)
    }
}
