//! Category index: the distinct, sorted values of one categorical column.

use crate::error::{DataResult, SchemaError};
use crate::table::Dataset;
use serde::Serialize;
use std::collections::BTreeSet;

/// Distinct values of a category column, ascending. Rebuilt whenever the
/// dataset changes, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryIndex {
    column: String,
    values: Vec<String>,
}

impl CategoryIndex {
    /// Collect the distinct non-null values of `column` in ascending lexical order.
    pub fn build(dataset: &Dataset, column: &str) -> DataResult<Self> {
        let col = dataset.column(column).ok_or_else(|| SchemaError::MissingColumn {
            column: column.to_string(),
            available: dataset.schema().column_names().iter().map(|s| s.to_string()).collect(),
        })?;

        let values: BTreeSet<&str> = col.iter().filter_map(|v| v.as_str()).collect();

        Ok(CategoryIndex {
            column: col.name().to_string(),
            values: values.into_iter().map(str::to_string).collect(),
        })
    }

    /// Index over an explicit list of values; duplicates are removed and the
    /// result is sorted.
    pub fn from_values<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        CategoryIndex {
            column: column.to_string(),
            values: values.into_iter().collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values
            .binary_search_by(|candidate| candidate.as_str().cmp(value))
            .is_ok()
    }

    /// Case-insensitive substring search over the index.
    ///
    /// A blank needle, or one that matches nothing, returns the whole index:
    /// search only narrows the choices when it finds at least one value.
    ///
    /// ```
    /// use canopy::CategoryIndex;
    ///
    /// let index = CategoryIndex::from_values("common_name", ["Elm", "Oak", "Pine"]);
    /// assert_eq!(index.search("el"), vec!["Elm"]);
    /// assert_eq!(index.search("zzz"), vec!["Elm", "Oak", "Pine"]);
    /// ```
    pub fn search(&self, needle: &str) -> Vec<&str> {
        let needle = needle.trim().to_lowercase();
        let all = || self.values.iter().map(String::as_str).collect::<Vec<_>>();
        if needle.is_empty() {
            return all();
        }

        let matches: Vec<&str> = self
            .values
            .iter()
            .filter(|v| v.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect();

        if matches.is_empty() {
            log::debug!("search '{}' matched nothing in '{}', showing all values", needle, self.column);
            all()
        } else {
            matches
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_dataset;

    #[test]
    fn test_build_sorted_distinct() {
        let dataset = sample_dataset(&[
            ("Pine", 2000, None),
            ("Elm", 2001, None),
            ("Pine", 2002, None),
            ("Oak", 2003, None),
        ]);
        let index = CategoryIndex::build(&dataset, "common_name").unwrap();
        assert_eq!(index.values(), &["Elm", "Oak", "Pine"]);
        assert_eq!(index.column(), "common_name");
        assert!(index.contains("Oak"));
        assert!(!index.contains("oak"));
    }

    #[test]
    fn test_build_unknown_column() {
        let dataset = sample_dataset(&[("Elm", 2001, None)]);
        assert!(CategoryIndex::build(&dataset, "suburb").is_err());
    }

    #[test]
    fn test_lexical_order_is_case_sensitive() {
        let index = CategoryIndex::from_values("c", ["elm", "Oak", "Ash", "Oak"]);
        assert_eq!(index.values(), &["Ash", "Oak", "elm"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let index = CategoryIndex::from_values("c", ["Elm", "Oak", "Pine", "Spotted Gum"]);
        assert_eq!(index.search("EL"), vec!["Elm"]);
        assert_eq!(index.search("gum"), vec!["Spotted Gum"]);
        assert_eq!(index.search("i"), vec!["Pine"]);
    }

    #[test]
    fn test_search_fallback_to_full_index() {
        let index = CategoryIndex::from_values("c", ["Elm", "Oak", "Pine"]);
        assert_eq!(index.search(""), vec!["Elm", "Oak", "Pine"]);
        assert_eq!(index.search("   "), vec!["Elm", "Oak", "Pine"]);
        assert_eq!(index.search("zzz-no-match"), vec!["Elm", "Oak", "Pine"]);
    }

    #[test]
    fn test_search_empty_index() {
        let index = CategoryIndex::default();
        assert!(index.search("elm").is_empty());
    }
}
