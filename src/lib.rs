/// Canopy - Reactive Data Exploration Core
///
/// Loads a delimited tabular dataset once, then recomputes a filtered view and
/// its aggregates from user selection state on every change. The dataset is
/// immutable after load and shared by reference; every derived value (category
/// index, filtered view, aggregation) is rebuilt from it rather than patched.

pub mod column;
pub mod table;
pub mod error;
pub mod config;
pub mod category;
pub mod selection;
pub mod changeset;
pub mod view;
pub mod aggregate;
pub mod loader;
#[cfg(feature = "excel")]
mod spreadsheet;
pub mod export;
pub mod session;

pub use column::{Column, ColumnValue, SemanticType};
pub use table::{normalize_identifier, Dataset, Record, Schema, Tabular};
pub use error::{DataError, DataResult, LoadError, SchemaError};
pub use config::{ChartKind, ColumnRoles, DefaultSelection, ExplorerConfig, PercentBase};
pub use category::CategoryIndex;
pub use selection::{effective_selection, Checklist, EffectiveSelection, SelectionSource, SelectionState};
pub use changeset::{Changeset, CriteriaChange};
pub use view::{FilterCriteria, FilterEngine, FilteredView, NumericRange};
pub use aggregate::{AggregationEngine, AggregationResult, CategoryCount, Summary};
pub use loader::{detect_delimiter, parse_delimited, CacheStats, DatasetLoader, Source};
pub use export::ExportService;
pub use session::{recompute, Explorer, Snapshot};
