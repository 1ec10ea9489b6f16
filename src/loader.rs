//! Dataset loading
//!
//! Parses delimited text (and, with the `excel` feature, workbooks) into a
//! [`Dataset`]:
//!
//! 1. Read rows with the `csv` reader (delimiter detected or configured)
//! 2. Normalize column identifiers
//! 3. Coerce year, continuous and geo columns; failures become nulls
//! 4. Pad short rows with nulls, then drop rows missing the category or year
//!    value. Rows longer than the header cannot be aligned and are dropped.
//!
//! ## Caching
//!
//! Parsing is pure given identical content, so [`DatasetLoader`] memoizes by
//! a content-derived key: canonical path + modification time + length for
//! files, buffer name + SHA-256 of the bytes for in-memory buffers. A cache
//! hit returns the same `Rc<Dataset>` without re-parsing. Only the newest
//! version of a file stays cached.

use crate::column::{ColumnValue, SemanticType};
use crate::config::ColumnRoles;
use crate::error::{DataResult, LoadError};
use crate::table::{normalize_identifier, Dataset, Schema};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

/// Workbook containers, read through the `excel` feature.
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Delimiters tried by detection, in tie-break order.
const DELIMITER_CANDIDATES: [u8; 3] = [b',', b'\t', b';'];

/// Records sampled when detecting the delimiter.
const DELIMITER_SAMPLE: usize = 5;

/// Handle to tabular data
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    Buffer { name: String, bytes: Vec<u8> },
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    pub fn buffer(name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        Source::Buffer {
            name: name.to_string(),
            bytes: bytes.into(),
        }
    }

    /// Display name used for the dataset: file stem or buffer name.
    pub fn name(&self) -> String {
        match self {
            Source::Path(path) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("data")
                .to_string(),
            Source::Buffer { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    File {
        path: PathBuf,
        modified: Option<SystemTime>,
        len: u64,
    },
    Content { name: String, digest: [u8; 32] },
}

impl CacheKey {
    /// Two keys for the same file are different versions of one source.
    fn same_file(&self, other: &CacheKey) -> bool {
        match (self, other) {
            (CacheKey::File { path: a, .. }, CacheKey::File { path: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Loads datasets under fixed column roles and memoizes them by source identity.
#[derive(Debug)]
pub struct DatasetLoader {
    roles: ColumnRoles,
    delimiter: Option<u8>,
    sheet: Option<String>,
    cache: HashMap<CacheKey, Rc<Dataset>>,
    hits: u64,
    misses: u64,
}

impl DatasetLoader {
    pub fn new(roles: ColumnRoles) -> Self {
        DatasetLoader {
            roles: roles.normalized(),
            delimiter: None,
            sheet: None,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Use a fixed delimiter instead of detecting one.
    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read this worksheet from workbooks instead of the first one.
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    /// Load `source`, returning the cached dataset when its content key is unchanged.
    pub fn load(&mut self, source: &Source) -> DataResult<Rc<Dataset>> {
        let key = cache_key(source)?;
        if let Some(dataset) = self.cache.get(&key) {
            self.hits += 1;
            log::debug!("cache hit for '{}'", source.name());
            return Ok(Rc::clone(dataset));
        }
        self.misses += 1;

        let dataset = Rc::new(self.parse_source(source)?);
        log::info!(
            "loaded '{}': {} records, {} columns",
            dataset.name(),
            dataset.len(),
            dataset.schema().len()
        );

        let before = self.cache.len();
        self.cache.retain(|cached, _| !cached.same_file(&key));
        if self.cache.len() < before {
            log::debug!("evicted stale version of '{}'", source.name());
        }
        self.cache.insert(key, Rc::clone(&dataset));
        Ok(dataset)
    }

    /// Forget the cached entry for `source`. Returns true if one was present.
    pub fn invalidate(&mut self, source: &Source) -> bool {
        match cache_key(source) {
            Ok(key) => self.cache.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }

    fn parse_source(&self, source: &Source) -> DataResult<Dataset> {
        match source {
            Source::Path(path) => {
                if let Some(dataset) = self.read_workbook(path, &source.name()) {
                    return dataset;
                }
                let bytes = std::fs::read(path).map_err(|e| LoadError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                let delimiter = self
                    .delimiter
                    .unwrap_or_else(|| detect_delimiter(Some(path), &bytes));
                parse_delimited(&bytes, &source.name(), &self.roles, delimiter)
            }
            Source::Buffer { bytes, .. } => {
                let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(None, bytes));
                parse_delimited(bytes, &source.name(), &self.roles, delimiter)
            }
        }
    }

    #[cfg(feature = "excel")]
    fn read_workbook(&self, path: &Path, name: &str) -> Option<DataResult<Dataset>> {
        spreadsheet_extension(path)?;
        Some(crate::spreadsheet::read_workbook(
            path,
            name,
            &self.roles,
            self.sheet.as_deref(),
        ))
    }

    #[cfg(not(feature = "excel"))]
    fn read_workbook(&self, _path: &Path, _name: &str) -> Option<DataResult<Dataset>> {
        None
    }
}

fn cache_key(source: &Source) -> Result<CacheKey, LoadError> {
    match source {
        Source::Path(path) => {
            reject_spreadsheet(path)?;
            let io_err = |e| LoadError::Io {
                path: path.clone(),
                source: e,
            };
            let canonical = path.canonicalize().map_err(io_err)?;
            let meta = std::fs::metadata(&canonical).map_err(io_err)?;
            Ok(CacheKey::File {
                path: canonical,
                modified: meta.modified().ok(),
                len: meta.len(),
            })
        }
        Source::Buffer { name, bytes } => Ok(CacheKey::Content {
            name: name.clone(),
            digest: Sha256::digest(bytes).into(),
        }),
    }
}

/// Lower-cased extension of `path` when it names a workbook.
fn spreadsheet_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    SPREADSHEET_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[cfg(feature = "excel")]
fn reject_spreadsheet(_path: &Path) -> Result<(), LoadError> {
    Ok(())
}

#[cfg(not(feature = "excel"))]
fn reject_spreadsheet(path: &Path) -> Result<(), LoadError> {
    match spreadsheet_extension(path) {
        Some(extension) => Err(LoadError::UnsupportedFormat { extension }),
        None => Ok(()),
    }
}

/// Pick a delimiter: `.tsv` means tab. Otherwise each candidate is trial-parsed
/// over the first records; the one giving the widest consistent field count
/// above one wins (comma, then tab, then semicolon on ties). Delimiters inside
/// quoted fields are not counted.
pub fn detect_delimiter(path: Option<&Path>, content: &[u8]) -> u8 {
    if let Some(ext) = path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
        if ext.eq_ignore_ascii_case("tsv") {
            return b'\t';
        }
    }

    let mut best = (b',', false, 0usize);
    for candidate in DELIMITER_CANDIDATES {
        let (consistent, width) = sample_width(content, candidate);
        if width > 1 && (consistent, width) > (best.1, best.2) {
            best = (candidate, consistent, width);
        }
    }
    best.0
}

/// Field count of the first record, and whether the sampled records agree with it.
fn sample_width(content: &[u8], delimiter: u8) -> (bool, usize) {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut widths = reader
        .byte_records()
        .take(DELIMITER_SAMPLE)
        .map_while(Result::ok)
        .map(|record| record.len());
    match widths.next() {
        Some(width) => (widths.all(|w| w == width), width),
        None => (false, 0),
    }
}

/// Role of a normalized header under `roles`.
fn semantic_type_for(name: &str, roles: &ColumnRoles) -> SemanticType {
    if name == roles.category || roles.extra_categories.iter().any(|c| c == name) {
        SemanticType::Category
    } else if name == roles.year {
        SemanticType::Year
    } else if roles.continuous.iter().any(|c| c == name) {
        SemanticType::Continuous
    } else if roles.latitude.as_deref() == Some(name) {
        SemanticType::Latitude
    } else if roles.longitude.as_deref() == Some(name) {
        SemanticType::Longitude
    } else {
        SemanticType::Text
    }
}

/// Turns a header and raw text rows into a dataset. Shared by the delimited
/// and workbook readers so both normalize, coerce and drop the same way.
pub(crate) struct RowAssembler<'r> {
    roles: &'r ColumnRoles,
    dataset: Dataset,
    types: Vec<SemanticType>,
    required: [Option<usize>; 2],
    padded: usize,
    overlong: usize,
    missing_required: usize,
}

impl<'r> RowAssembler<'r> {
    /// Build the schema from raw header cells. Blank headers become `column_N`.
    pub(crate) fn new<'c, I>(name: &str, roles: &'r ColumnRoles, headers: I) -> DataResult<Self>
    where
        I: IntoIterator<Item = Cow<'c, str>>,
    {
        let raw: Vec<Cow<'c, str>> = headers.into_iter().collect();
        if raw.is_empty() || (raw.len() == 1 && raw[0].trim().is_empty()) {
            return Err(LoadError::Empty(name.to_string()).into());
        }

        let columns: Vec<(String, SemanticType)> = raw
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let mut normalized = normalize_identifier(cell);
                if normalized.is_empty() {
                    normalized = format!("column_{}", i + 1);
                }
                let ty = semantic_type_for(&normalized, roles);
                (normalized, ty)
            })
            .collect();

        for optional in roles
            .continuous
            .iter()
            .chain(&roles.extra_categories)
            .chain(roles.latitude.iter())
            .chain(roles.longitude.iter())
        {
            if !columns.iter().any(|(n, _)| n == optional) {
                log::debug!("optional column '{}' not present in '{}'", optional, name);
            }
        }

        let types: Vec<SemanticType> = columns.iter().map(|(_, ty)| *ty).collect();
        let dataset = Dataset::new(name, Schema::new(columns), &roles.category, &roles.year)?;
        let required = [
            dataset.schema().column_index(&roles.category),
            dataset.schema().column_index(&roles.year),
        ];
        Ok(RowAssembler {
            roles,
            dataset,
            types,
            required,
            padded: 0,
            overlong: 0,
            missing_required: 0,
        })
    }

    /// Coerce and append one row. Short rows are padded with nulls; rows
    /// longer than the header and rows missing category or year are dropped.
    pub(crate) fn push<'c, I>(&mut self, cells: I) -> DataResult<()>
    where
        I: IntoIterator<Item = Cow<'c, str>>,
    {
        let mut row: Vec<ColumnValue> = Vec::with_capacity(self.types.len());
        let mut extra = false;
        for (i, cell) in cells.into_iter().enumerate() {
            match self.types.get(i) {
                Some(ty) => row.push(ColumnValue::coerce(&cell, *ty)),
                None if cell.trim().is_empty() => {}
                None => extra = true,
            }
        }

        if row.iter().all(ColumnValue::is_null) {
            // blank line
            return Ok(());
        }
        if extra {
            self.overlong += 1;
            return Ok(());
        }
        if row.len() < self.types.len() {
            self.padded += 1;
            row.resize(self.types.len(), ColumnValue::Null);
        }

        let has_required = self
            .required
            .iter()
            .all(|idx| idx.map_or(false, |i| !row[i].is_null()));
        if !has_required {
            self.missing_required += 1;
            return Ok(());
        }

        self.dataset.append_row(row)
    }

    pub(crate) fn finish(self) -> Dataset {
        let name = self.dataset.name();
        if self.padded > 0 {
            log::debug!("'{}': padded {} short row(s) with nulls", name, self.padded);
        }
        if self.overlong > 0 || self.missing_required > 0 {
            log::warn!(
                "'{}': dropped {} over-long row(s) and {} row(s) missing '{}' or '{}'",
                name,
                self.overlong,
                self.missing_required,
                self.roles.category,
                self.roles.year
            );
        }
        self.dataset
    }
}

/// Parse delimited bytes into a dataset. `roles` must already be normalized.
///
/// ```
/// use canopy::{parse_delimited, ColumnRoles};
///
/// let csv = "Common Name,Year Planted,Height\nElm,1998,12.5\n,2001,3\nOak,unknown,4\nAsh,2004\n";
/// let roles = ColumnRoles::new("common_name", "year_planted").with_continuous("height");
/// let dataset = parse_delimited(csv.as_bytes(), "trees", &roles, b',').unwrap();
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(dataset.schema().column_names(), vec!["common_name", "year_planted", "height"]);
/// assert!(dataset.row(1).unwrap().get("height").unwrap().is_null());
/// ```
pub fn parse_delimited(
    bytes: &[u8],
    name: &str,
    roles: &ColumnRoles,
    delimiter: u8,
) -> DataResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.byte_headers().map_err(LoadError::Csv)?.clone();
    let mut assembler =
        RowAssembler::new(name, roles, headers.iter().map(String::from_utf8_lossy))?;

    let mut record = csv::ByteRecord::new();
    while reader.read_byte_record(&mut record).map_err(LoadError::Csv)? {
        assembler.push(record.iter().map(String::from_utf8_lossy))?;
    }
    Ok(assembler.finish())
}
