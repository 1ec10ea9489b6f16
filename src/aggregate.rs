//! Aggregation over a filtered view
//!
//! Frequency counts per category with percentages, and scalar summaries
//! (total, distinct categories, mean of each continuous column). Results are
//! recomputed from scratch for every criteria change and never mutated.
//!
//! A zero denominator yields zero percentages and absent means, never NaN.

use crate::column::SemanticType;
use crate::config::PercentBase;
use crate::view::FilteredView;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One group of the frequency table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
    /// Share of the denominator, rounded to one decimal
    pub percentage: f64,
}

/// Scalar summaries of a filtered view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub distinct_categories: usize,
    /// Mean of each continuous column in schema order; `None` when the view
    /// has no non-null value for that column
    pub means: Vec<(String, Option<f64>)>,
}

impl Summary {
    /// Mean of `column`. `None` both for unknown columns and for columns with
    /// no values in the view.
    pub fn mean(&self, column: &str) -> Option<f64> {
        let column = crate::table::normalize_identifier(column);
        self.means
            .iter()
            .find(|(name, _)| *name == column)
            .and_then(|(_, mean)| *mean)
    }
}

/// Counts sorted by descending count, ties by category ascending, plus the
/// view summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    pub groups: Vec<CategoryCount>,
    pub summary: Summary,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of group counts; always equals the filtered view length.
    pub fn counted(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub fn group(&self, category: &str) -> Option<&CategoryCount> {
        self.groups.iter().find(|g| g.category == category)
    }
}

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Computes aggregates with a fixed percentage policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationEngine {
    percent_base: PercentBase,
}

impl AggregationEngine {
    pub fn new(percent_base: PercentBase) -> Self {
        AggregationEngine { percent_base }
    }

    pub fn percent_base(&self) -> PercentBase {
        self.percent_base
    }

    /// Frequency table for `view`.
    ///
    /// ```
    /// use canopy::{AggregationEngine, ColumnValue, Dataset, FilteredView, Schema, SemanticType};
    /// use std::rc::Rc;
    ///
    /// let schema = Schema::new(vec![
    ///     ("species".to_string(), SemanticType::Category),
    ///     ("year".to_string(), SemanticType::Year),
    /// ]);
    /// let mut dataset = Dataset::new("trees", schema, "species", "year").unwrap();
    /// for name in ["Oak", "Elm", "Oak", "Pine", "Elm", "Oak"] {
    ///     dataset.append_row(vec![ColumnValue::Text(name.into()), ColumnValue::Int(2000)]).unwrap();
    /// }
    /// let view = FilteredView::all(&Rc::new(dataset));
    ///
    /// let result = AggregationEngine::default().counts(&view);
    /// let rows: Vec<_> = result.groups.iter().map(|g| (g.category.as_str(), g.count, g.percentage)).collect();
    /// assert_eq!(rows, vec![("Oak", 3, 50.0), ("Elm", 2, 33.3), ("Pine", 1, 16.7)]);
    /// ```
    pub fn counts(&self, view: &FilteredView) -> AggregationResult {
        let mut tally: HashMap<&str, usize> = HashMap::new();
        for record in view.iter() {
            *tally.entry(record.category()).or_insert(0) += 1;
        }

        let denominator = match self.percent_base {
            PercentBase::Filtered => view.len(),
            PercentBase::Dataset => view.dataset().len(),
        };

        let mut groups: Vec<CategoryCount> = tally
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
                percentage: if denominator == 0 {
                    0.0
                } else {
                    round1(count as f64 / denominator as f64 * 100.0)
                },
            })
            .collect();

        groups.sort_by(|a, b| match b.count.cmp(&a.count) {
            Ordering::Equal => a.category.cmp(&b.category),
            other => other,
        });

        AggregationResult {
            summary: Self::summary(view),
            groups,
        }
    }

    /// Total, distinct category count and per-column means for `view`.
    pub fn summary(view: &FilteredView) -> Summary {
        let dataset = view.dataset();
        let continuous = dataset.schema().columns_of_type(SemanticType::Continuous);

        let means = continuous
            .iter()
            .map(|name| {
                let (sum, n) = match dataset.column(name) {
                    Some(col) => view
                        .row_indices()
                        .iter()
                        .filter_map(|&i| col.get_f64(i))
                        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1)),
                    None => (0.0, 0),
                };
                let mean = (n > 0).then(|| sum / n as f64);
                (name.to_string(), mean)
            })
            .collect();

        let distinct_categories = view
            .iter()
            .map(|r| r.category())
            .collect::<std::collections::HashSet<_>>()
            .len();

        Summary {
            total: view.len(),
            distinct_categories,
            means,
        }
    }
}
