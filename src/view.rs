/// Canopy Filter Engine
///
/// A FilteredView is a read-only, order-preserving subsequence of a dataset.
/// It keeps a mapping from view positions to dataset row indices, like a
/// database index, and shares the dataset itself through `Rc`.
///
/// The predicate is the conjunction of category membership in the effective
/// selection and every declared numeric range. A null cell on a ranged column
/// fails that range; an empty effective selection matches nothing.

use crate::column::{Column, ColumnValue};
use crate::selection::{effective_selection, Checklist, SelectionSource, SelectionState};
use crate::table::{normalize_identifier, Dataset, Record, Schema, Tabular};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    /// Bounds given in either order are stored low-to-high.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            NumericRange { min: a, max: b }
        } else {
            NumericRange { min: b, max: a }
        }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Snapshot of everything that decides the filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    /// Which state object supplied `selection`
    pub source: SelectionSource,
    /// Effective category selection
    pub selection: Vec<String>,
    /// Inclusive bounds keyed by normalized column name
    pub ranges: BTreeMap<String, NumericRange>,
    /// Search text; narrows the category choices, not the records
    pub search: String,
}

impl FilterCriteria {
    /// Capture the current state, resolving the selection source by precedence.
    pub fn capture(
        selection: &SelectionState,
        checklist: &Checklist,
        ranges: &BTreeMap<String, NumericRange>,
        search: &str,
    ) -> Self {
        let effective = effective_selection(selection, checklist);
        FilterCriteria {
            source: effective.source,
            selection: effective.values.to_vec(),
            ranges: ranges.clone(),
            search: search.to_string(),
        }
    }

    /// Criteria selecting exactly `values` with no ranges.
    pub fn selecting<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterCriteria {
            selection: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, column: &str, range: NumericRange) -> Self {
        self.ranges.insert(normalize_identifier(column), range);
        self
    }
}

/// Applies filter criteria to a dataset.
pub struct FilterEngine;

impl FilterEngine {
    /// Produce the filtered view for `criteria`. Never fails; the result may
    /// be empty.
    ///
    /// ```
    /// use canopy::{ColumnValue, Dataset, FilterCriteria, FilterEngine, NumericRange, Schema, SemanticType};
    /// use std::rc::Rc;
    ///
    /// let schema = Schema::new(vec![
    ///     ("species".to_string(), SemanticType::Category),
    ///     ("year".to_string(), SemanticType::Year),
    /// ]);
    /// let mut dataset = Dataset::new("trees", schema, "species", "year").unwrap();
    /// for (name, year) in [("Elm", 1990), ("Oak", 2005), ("Elm", 2010)] {
    ///     dataset.append_row(vec![ColumnValue::Text(name.into()), ColumnValue::Int(year)]).unwrap();
    /// }
    /// let dataset = Rc::new(dataset);
    ///
    /// let criteria = FilterCriteria::selecting(["Elm"]).with_range("year", NumericRange::new(2000.0, 2020.0));
    /// let view = FilterEngine::apply(&dataset, &criteria);
    /// assert_eq!(view.row_indices(), &[2]);
    /// ```
    pub fn apply(dataset: &Rc<Dataset>, criteria: &FilterCriteria) -> FilteredView {
        let mut view = FilteredView {
            dataset: Rc::clone(dataset),
            view_to_parent: Vec::new(),
        };
        if criteria.selection.is_empty() {
            log::debug!("empty effective selection, filtered view is empty");
            return view;
        }

        let selected: HashSet<&str> = criteria.selection.iter().map(String::as_str).collect();
        // Resolve range columns once; an unknown column has no values, so nothing passes it.
        let ranges: Vec<(Option<&Column>, &NumericRange)> = criteria
            .ranges
            .iter()
            .map(|(column, range)| (dataset.column(column), range))
            .collect();

        for record in dataset.iter() {
            if !selected.contains(record.category()) {
                continue;
            }
            let in_ranges = ranges.iter().all(|(col, range)| {
                col.and_then(|c| c.get_f64(record.index()))
                    .map_or(false, |v| range.contains(v))
            });
            if in_ranges {
                view.view_to_parent.push(record.index());
            }
        }

        log::debug!(
            "filtered {} of {} records ({:?}, {} range(s))",
            view.len(),
            dataset.len(),
            criteria.source,
            criteria.ranges.len()
        );
        view
    }
}

/// Order-preserving subsequence of a dataset's records.
#[derive(Clone)]
pub struct FilteredView {
    dataset: Rc<Dataset>,
    view_to_parent: Vec<usize>,
}

impl FilteredView {
    /// View containing every record of `dataset`.
    pub fn all(dataset: &Rc<Dataset>) -> Self {
        FilteredView {
            dataset: Rc::clone(dataset),
            view_to_parent: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &Rc<Dataset> {
        &self.dataset
    }

    pub fn len(&self) -> usize {
        self.view_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_parent.is_empty()
    }

    /// Dataset row index of each view position.
    pub fn row_indices(&self) -> &[usize] {
        &self.view_to_parent
    }

    pub fn get(&self, index: usize) -> Option<Record<'_>> {
        self.view_to_parent
            .get(index)
            .and_then(|&parent| self.dataset.row(parent))
    }

    pub fn get_value(&self, row: usize, column: &str) -> Option<&ColumnValue> {
        self.get(row).and_then(|r| r.get(column))
    }

    pub fn iter(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.view_to_parent
            .iter()
            .filter_map(move |&parent| self.dataset.row(parent))
    }

    /// First `n` records, for table previews.
    pub fn head(&self, n: usize) -> Vec<Record<'_>> {
        self.iter().take(n).collect()
    }

    /// (category, latitude, longitude) for records with both coordinates.
    pub fn geo_points(&self) -> Vec<(&str, f64, f64)> {
        self.iter()
            .filter_map(|r| r.geo().map(|(lat, lon)| (r.category(), lat, lon)))
            .collect()
    }
}

impl std::fmt::Debug for FilteredView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredView")
            .field("dataset", &self.dataset.name())
            .field("rows", &self.view_to_parent)
            .finish()
    }
}

impl PartialEq for FilteredView {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.dataset, &other.dataset) && self.view_to_parent == other.view_to_parent
    }
}

impl Tabular for FilteredView {
    fn schema(&self) -> &Schema {
        self.dataset.schema()
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn records(&self) -> Box<dyn Iterator<Item = Record<'_>> + '_> {
        Box::new(self.iter())
    }
}
