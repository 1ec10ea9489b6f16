//! Selection state and the user checklist
//!
//! Two independent sources can drive the category filter. [`SelectionState`]
//! always mirrors values that exist in the current [`CategoryIndex`];
//! [`Checklist`] is an append-only log of labels the user added by hand and is
//! never checked against the index. When the checklist has any entry it wins.

use crate::category::CategoryIndex;
use crate::config::DefaultSelection;
use serde::Serialize;

/// Ordered set of category values chosen from the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    values: Vec<String>,
}

impl SelectionState {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial selection for a freshly built index.
    pub fn initial(index: &CategoryIndex, policy: DefaultSelection) -> Self {
        let take = match policy {
            DefaultSelection::FirstK { k } => k,
            DefaultSelection::All => index.len(),
        };
        SelectionState {
            values: index.values().iter().take(take).cloned().collect(),
        }
    }

    /// Replace the selection with a user edit. Duplicates collapse to their
    /// first occurrence and the result is reconciled against `index`, so
    /// values the index does not hold are never admitted.
    pub fn select<I, S>(&mut self, values: I, index: &CategoryIndex)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next: Vec<String> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !next.contains(&value) {
                next.push(value);
            }
        }
        self.values = next;
        self.reconcile(index);
    }

    /// Drop members missing from `index`, keeping the relative order of the
    /// rest. Never adds members. Returns how many were dropped.
    pub fn reconcile(&mut self, index: &CategoryIndex) -> usize {
        let before = self.values.len();
        self.values.retain(|v| index.contains(v));
        let dropped = before - self.values.len();
        if dropped > 0 {
            log::debug!("reconcile dropped {} stale selection value(s)", dropped);
        }
        dropped
    }

    /// Non-mutating form of [`reconcile`](Self::reconcile).
    pub fn reconciled(&self, index: &CategoryIndex) -> Self {
        let mut next = self.clone();
        next.reconcile(index);
        next
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
        self.values.iter().any(|v| v == value)
    }
}

/// Append-only, user-built list of category labels.
///
/// ```
/// use canopy::Checklist;
///
/// let mut checklist = Checklist::new();
/// assert!(checklist.add("Birch"));
/// assert!(!checklist.add("Birch"));
/// assert!(!checklist.add("  "));
/// assert!(checklist.add("Elm"));
/// assert_eq!(checklist.labels(), &["Birch", "Elm"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Checklist {
    labels: Vec<String>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `label` unless it is blank or already present (exact,
    /// case-sensitive match after trimming). Returns true if it was added.
    pub fn add(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Session reset is the only way a checklist shrinks.
    pub(crate) fn clear(&mut self) {
        self.labels.clear();
    }
}

/// Where the effective selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    #[default]
    Selection,
    Checklist,
}

/// Category values the filter engine matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSelection<'a> {
    pub source: SelectionSource,
    pub values: &'a [String],
}

/// Resolve the effective selection: a non-empty checklist takes precedence
/// over the selection state.
///
/// ```
/// use canopy::{effective_selection, CategoryIndex, Checklist, SelectionSource, SelectionState};
///
/// let index = CategoryIndex::from_values("common_name", ["Elm", "Oak"]);
/// let mut selection = SelectionState::new();
/// selection.select(["Oak", "Elm"], &index);
/// let mut checklist = Checklist::new();
/// checklist.add("Birch");
///
/// let effective = effective_selection(&selection, &checklist);
/// assert_eq!(effective.source, SelectionSource::Checklist);
/// assert_eq!(effective.values, &["Birch"]);
/// ```
pub fn effective_selection<'a>(
    selection: &'a SelectionState,
    checklist: &'a Checklist,
) -> EffectiveSelection<'a> {
    if checklist.is_empty() {
        EffectiveSelection {
            source: SelectionSource::Selection,
            values: selection.values(),
        }
    } else {
        EffectiveSelection {
            source: SelectionSource::Checklist,
            values: checklist.labels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn index(values: &[&str]) -> CategoryIndex {
        CategoryIndex::from_values("common_name", values.iter().copied())
    }

    #[test]
    fn test_initial_first_k() {
        let idx = index(&["Ash", "Birch", "Elm", "Gum", "Oak", "Pine", "Plane"]);
        let selection = SelectionState::initial(&idx, DefaultSelection::FirstK { k: 5 });
        assert_eq!(selection.values(), &["Ash", "Birch", "Elm", "Gum", "Oak"]);

        let small = index(&["Elm", "Oak"]);
        let selection = SelectionState::initial(&small, DefaultSelection::FirstK { k: 5 });
        assert_eq!(selection.values(), &["Elm", "Oak"]);
    }

    #[test]
    fn test_initial_all() {
        let idx = index(&["Ash", "Birch", "Elm", "Gum", "Oak", "Pine"]);
        let selection = SelectionState::initial(&idx, DefaultSelection::All);
        assert_eq!(selection.len(), 6);
    }

    #[test]
    fn test_reconcile_drops_stale_keeps_order() {
        let idx = index(&["Elm", "Oak", "Pine"]);
        let mut selection = SelectionState::new();
        selection.select(["Pine", "Elm"], &idx);
        assert_eq!(selection.values(), &["Pine", "Elm"]);

        let reloaded = index(&["Elm", "Oak"]);
        assert_eq!(selection.reconcile(&reloaded), 1);
        assert_eq!(selection.values(), &["Elm"]);
        assert_eq!(selection.reconcile(&reloaded), 0);
    }

    #[test]
    fn test_select_rejects_unknown_and_duplicates() {
        let idx = index(&["Elm", "Oak"]);
        let mut selection = SelectionState::new();
        selection.select(["Oak", "Birch", "Oak", "Elm"], &idx);
        assert_eq!(selection.values(), &["Oak", "Elm"]);
    }

    #[test]
    fn test_checklist_ignores_blank_and_duplicates() {
        let mut checklist = Checklist::new();
        assert!(!checklist.add(""));
        assert!(checklist.add("Oak"));
        assert!(checklist.add("oak"));
        assert!(!checklist.add("Oak"));
        assert!(!checklist.add(" Oak "));
        assert_eq!(checklist.labels(), &["Oak", "oak"]);
    }

    #[test]
    fn test_checklist_clear() {
        let mut checklist = Checklist::new();
        checklist.add("Oak");
        checklist.clear();
        assert!(checklist.is_empty());
    }

    #[test]
    fn test_precedence_selection_when_checklist_empty() {
        let idx = index(&["Elm", "Oak"]);
        let mut selection = SelectionState::new();
        selection.select(["Oak", "Elm"], &idx);
        let checklist = Checklist::new();

        let effective = effective_selection(&selection, &checklist);
        assert_eq!(effective.source, SelectionSource::Selection);
        assert_eq!(effective.values, &["Oak", "Elm"]);
    }

    #[test]
    fn test_precedence_checklist_wins_even_if_absent_from_index() {
        let idx = index(&["Elm", "Oak"]);
        let mut selection = SelectionState::new();
        selection.select(["Oak", "Elm"], &idx);
        let mut checklist = Checklist::new();
        checklist.add("Birch");

        let effective = effective_selection(&selection, &checklist);
        assert_eq!(effective.source, SelectionSource::Checklist);
        assert_eq!(effective.values, &["Birch"]);
    }

    #[test]
    fn test_both_empty() {
        let selection = SelectionState::new();
        let checklist = Checklist::new();
        let effective = effective_selection(&selection, &checklist);
        assert_eq!(effective.source, SelectionSource::Selection);
        assert!(effective.values.is_empty());
    }

    proptest! {
        #[test]
        fn prop_reconcile_idempotent(
            selected in proptest::collection::vec("[a-e]{1,2}", 0..12),
            indexed in proptest::collection::vec("[a-e]{1,2}", 0..12),
        ) {
            let idx = CategoryIndex::from_values("c", indexed);
            let selection = SelectionState { values: selected };
            let once = selection.reconciled(&idx);
            prop_assert_eq!(once.reconciled(&idx), once.clone());
            prop_assert!(once.values().iter().all(|v| idx.contains(v)));
        }

        #[test]
        fn prop_checklist_add_idempotent_and_ordered(
            labels in proptest::collection::vec("[A-Za-z]{1,6}", 0..10),
            extra in "[A-Za-z]{1,6}",
        ) {
            let mut checklist = Checklist::new();
            for label in &labels {
                checklist.add(label);
            }
            let before = checklist.clone();
            if checklist.contains(&extra) {
                prop_assert!(!checklist.add(&extra));
                prop_assert_eq!(checklist, before);
            } else {
                prop_assert!(checklist.add(&extra));
                prop_assert_eq!(checklist.labels().last().map(String::as_str), Some(extra.as_str()));
                prop_assert_eq!(&checklist.labels()[..before.len()], before.labels());
            }
        }
    }
}
