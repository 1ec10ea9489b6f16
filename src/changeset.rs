/// Changeset - Criteria Change Log for Canopy
///
/// Every user-visible state change (selection edit, checklist add, range
/// change, search text change, reload, reset) is recorded here before the
/// session recomputes. The generation counter identifies which change the
/// current snapshot reflects; overlapping triggers resolve last-write-wins.
///
/// # Usage Pattern
///
/// 1. A session mutator updates its state and pushes a `CriteriaChange`
/// 2. The push bumps the generation
/// 3. The session runs one full recomputation and stamps the snapshot with
///    the new generation
/// 4. Consumers compare generations to know whether to redraw

use crate::view::NumericRange;
use serde::Serialize;

/// A single change to the filter criteria or its inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriteriaChange {
    /// The selection state was replaced by a user edit
    SelectionEdited { values: Vec<String> },

    /// A label was appended to the checklist
    ChecklistAdded { label: String },

    /// A numeric range was set (`Some`) or removed (`None`)
    RangeChanged {
        column: String,
        range: Option<NumericRange>,
    },

    /// The category search text changed
    SearchChanged { text: String },

    /// The dataset was (re)loaded; `rows` is the new record count
    DatasetReloaded { rows: usize },

    /// Session state returned to its start values
    SessionReset,
}

impl CriteriaChange {
    /// Returns true if this change can alter which records pass the filter.
    /// Search text only narrows the choices offered, never the records.
    pub fn affects_view(&self) -> bool {
        !matches!(self, CriteriaChange::SearchChanged { .. })
    }
}

/// Changes retained by a default changeset
pub const DEFAULT_CHANGE_LIMIT: usize = 64;

/// Log of the most recent changes with a monotonically increasing generation.
/// Older entries are discarded once `limit` is reached; the generation keeps counting.
#[derive(Debug, Clone)]
pub struct Changeset {
    changes: Vec<CriteriaChange>,
    generation: u64,
    limit: usize,
}

impl Default for Changeset {
    fn default() -> Self {
        Self::with_limit(DEFAULT_CHANGE_LIMIT)
    }
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` changes (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Changeset {
            changes: Vec::new(),
            generation: 0,
            limit: limit.max(1),
        }
    }

    /// Record a change and return the new generation
    pub fn push(&mut self, change: CriteriaChange) -> u64 {
        log::debug!("criteria change #{}: {:?}", self.generation + 1, change);
        if self.changes.len() >= self.limit {
            let excess = self.changes.len() + 1 - self.limit;
            self.changes.drain(..excess);
        }
        self.changes.push(change);
        self.generation += 1;
        self.generation
    }

    /// Retained changes since the last drain, oldest first
    pub fn changes(&self) -> &[CriteriaChange] {
        &self.changes
    }

    /// The most recent change, if any
    pub fn last(&self) -> Option<&CriteriaChange> {
        self.changes.last()
    }

    /// Returns the current generation number
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Drain changes, returning ownership. The generation is kept.
    pub fn drain(&mut self) -> Vec<CriteriaChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_bumps_generation() {
        let mut changes = Changeset::new();
        assert_eq!(changes.generation(), 0);
        assert_eq!(changes.push(CriteriaChange::ChecklistAdded { label: "Oak".into() }), 1);
        assert_eq!(changes.push(CriteriaChange::SearchChanged { text: "el".into() }), 2);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.last(), Some(&CriteriaChange::SearchChanged { text: "el".into() }));
    }

    #[test]
    fn test_drain_keeps_generation() {
        let mut changes = Changeset::new();
        changes.push(CriteriaChange::SessionReset);
        let drained = changes.drain();
        assert_eq!(drained, vec![CriteriaChange::SessionReset]);
        assert!(changes.is_empty());
        assert_eq!(changes.generation(), 1);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut changes = Changeset::with_limit(3);
        for i in 0..100 {
            changes.push(CriteriaChange::SearchChanged { text: i.to_string() });
        }
        assert_eq!(changes.len(), 3);
        assert_eq!(changes.generation(), 100);
        assert_eq!(changes.changes()[0], CriteriaChange::SearchChanged { text: "97".into() });
        assert_eq!(changes.last(), Some(&CriteriaChange::SearchChanged { text: "99".into() }));
        assert_eq!(Changeset::new().limit, DEFAULT_CHANGE_LIMIT);
    }

    #[test]
    fn test_search_does_not_affect_view() {
        assert!(!CriteriaChange::SearchChanged { text: "x".into() }.affects_view());
        assert!(CriteriaChange::RangeChanged { column: "height".into(), range: None }.affects_view());
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_string(&CriteriaChange::ChecklistAdded { label: "Birch".into() }).unwrap();
        assert_eq!(json, r#"{"type":"checklist_added","label":"Birch"}"#);
    }
}
