//! Exploration session
//!
//! [`Explorer`] owns the per-session state (selection, checklist, ranges,
//! search text) and runs one complete recomputation after every change:
//! cached load → category index → reconciliation → filter → aggregation.
//! Consumers only ever see the [`Snapshot`] produced by a finished pass.

use crate::aggregate::{AggregationEngine, AggregationResult};
use crate::category::CategoryIndex;
use crate::changeset::{Changeset, CriteriaChange};
use crate::config::ExplorerConfig;
use crate::error::{DataResult, SchemaError};
use crate::loader::{DatasetLoader, Source};
use crate::selection::{Checklist, SelectionState};
use crate::table::{normalize_identifier, Dataset, Record};
use crate::view::{FilterCriteria, FilterEngine, FilteredView, NumericRange};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Pure recomputation: filter `dataset` by `criteria` and aggregate the result.
pub fn recompute(
    dataset: &Rc<Dataset>,
    criteria: &FilterCriteria,
    engine: &AggregationEngine,
) -> (FilteredView, AggregationResult) {
    let view = FilterEngine::apply(dataset, criteria);
    let aggregation = engine.counts(&view);
    (view, aggregation)
}

/// Output of one finished recomputation pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Changeset generation this snapshot reflects
    pub generation: u64,
    pub criteria: FilterCriteria,
    pub view: FilteredView,
    pub aggregation: AggregationResult,
}

/// One user session over one source.
pub struct Explorer {
    config: ExplorerConfig,
    loader: DatasetLoader,
    source: Source,
    engine: AggregationEngine,
    dataset: Rc<Dataset>,
    index: CategoryIndex,
    selection: SelectionState,
    checklist: Checklist,
    ranges: BTreeMap<String, NumericRange>,
    search: String,
    changes: Changeset,
    snapshot: Snapshot,
}

impl Explorer {
    /// Load `source` and start a session with the default selection.
    pub fn open(source: Source, config: ExplorerConfig) -> DataResult<Self> {
        let loader = DatasetLoader::new(config.columns.clone())
            .with_delimiter(config.delimiter_byte())
            .with_sheet(config.sheet.clone());
        Self::with_loader(loader, source, config)
    }

    /// Start a session with an existing (possibly warm) loader.
    pub fn with_loader(
        mut loader: DatasetLoader,
        source: Source,
        config: ExplorerConfig,
    ) -> DataResult<Self> {
        let dataset = loader.load(&source)?;
        let index = CategoryIndex::build(&dataset, dataset.category_column())?;
        let selection = SelectionState::initial(&index, config.default_selection);
        let engine = AggregationEngine::new(config.percent_base);

        let criteria = FilterCriteria::default();
        let (view, aggregation) = recompute(&dataset, &criteria, &engine);
        let mut explorer = Explorer {
            config,
            loader,
            source,
            engine,
            dataset,
            index,
            selection,
            checklist: Checklist::new(),
            ranges: BTreeMap::new(),
            search: String::new(),
            changes: Changeset::new(),
            snapshot: Snapshot {
                generation: 0,
                criteria,
                view,
                aggregation,
            },
        };
        let rows = explorer.dataset.len();
        explorer.commit(CriteriaChange::DatasetReloaded { rows });
        Ok(explorer)
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Rc<Dataset> {
        &self.dataset
    }

    pub fn index(&self) -> &CategoryIndex {
        &self.index
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn ranges(&self) -> &BTreeMap<String, NumericRange> {
        &self.ranges
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Category choices offered to the user: the index narrowed by the
    /// current search text (or all of it when nothing matches).
    pub fn options(&self) -> Vec<&str> {
        self.index.search(&self.search)
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    pub fn changes(&self) -> &Changeset {
        &self.changes
    }

    pub fn generation(&self) -> u64 {
        self.changes.generation()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn view(&self) -> &FilteredView {
        &self.snapshot.view
    }

    pub fn aggregation(&self) -> &AggregationResult {
        &self.snapshot.aggregation
    }

    /// Table preview rows (`preview_rows` from the configuration).
    pub fn preview(&self) -> Vec<Record<'_>> {
        self.snapshot.view.head(self.config.preview_rows)
    }

    /// Replace the category selection. Values missing from the index are dropped.
    pub fn select<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.select(values, &self.index);
        let values = self.selection.values().to_vec();
        self.commit(CriteriaChange::SelectionEdited { values });
    }

    /// Append a label to the checklist. Returns false (and changes nothing)
    /// for blank or already present labels.
    pub fn add_to_checklist(&mut self, label: &str) -> bool {
        if !self.checklist.add(label) {
            return false;
        }
        self.commit(CriteriaChange::ChecklistAdded {
            label: label.trim().to_string(),
        });
        true
    }

    /// Set (`Some`) or clear (`None`) the range on a numeric column.
    pub fn set_range(&mut self, column: &str, range: Option<NumericRange>) -> DataResult<()> {
        let column = normalize_identifier(column);
        match self.dataset.schema().column_type(&column) {
            None => {
                return Err(SchemaError::MissingColumn {
                    column,
                    available: self
                        .dataset
                        .schema()
                        .column_names()
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                }
                .into())
            }
            Some(ty) if !ty.is_numeric() => {
                return Err(SchemaError::NotNumeric { column }.into());
            }
            Some(_) => {}
        }

        match range {
            Some(r) => self.ranges.insert(column.clone(), r),
            None => self.ranges.remove(&column),
        };
        self.commit(CriteriaChange::RangeChanged { column, range });
        Ok(())
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
        self.commit(CriteriaChange::SearchChanged {
            text: text.to_string(),
        });
    }

    /// Re-run the cached loader. When the source changed, the index is rebuilt
    /// and the selection reconciled against it; the checklist is untouched.
    pub fn reload(&mut self) -> DataResult<()> {
        let dataset = self.loader.load(&self.source)?;
        if !Rc::ptr_eq(&dataset, &self.dataset) {
            self.index = CategoryIndex::build(&dataset, dataset.category_column())?;
            self.dataset = dataset;
            self.selection.reconcile(&self.index);
        }
        let rows = self.dataset.len();
        self.commit(CriteriaChange::DatasetReloaded { rows });
        Ok(())
    }

    /// Return to session-start state: empty checklist, no ranges, no search,
    /// default selection.
    pub fn reset(&mut self) {
        self.checklist.clear();
        self.ranges.clear();
        self.search.clear();
        self.selection = SelectionState::initial(&self.index, self.config.default_selection);
        self.commit(CriteriaChange::SessionReset);
    }

    fn commit(&mut self, change: CriteriaChange) {
        let affects_view = change.affects_view();
        let generation = self.changes.push(change);
        let criteria =
            FilterCriteria::capture(&self.selection, &self.checklist, &self.ranges, &self.search);

        if affects_view || criteria.selection != self.snapshot.criteria.selection {
            let (view, aggregation) = recompute(&self.dataset, &criteria, &self.engine);
            self.snapshot = Snapshot {
                generation,
                criteria,
                view,
                aggregation,
            };
        } else {
            self.snapshot.generation = generation;
            self.snapshot.criteria = criteria;
        }
    }
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("dataset", &self.dataset)
            .field("selection", &self.selection)
            .field("checklist", &self.checklist)
            .field("ranges", &self.ranges)
            .field("search", &self.search)
            .field("generation", &self.changes.generation())
            .finish()
    }
}
