//! Addressing, read options and write outcomes.
//!
//! Every call names its target with a [`Namespace`]; there is no default
//! database or collection. Reads that return several documents take
//! [`FindOptions`], built from the caller's sort keys and limit.

use std::fmt;

use crate::value::DataMap;

/// The `(database, collection)` pair an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// The numeric form used in sort documents.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One sort key. Keys in a slice are applied left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by. Dotted paths are allowed.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// Options for multi-document reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Sort keys, most significant first. Empty leaves store order.
    pub sort: Vec<Sort>,
    /// Maximum number of documents to return. `None` is unlimited.
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Builds options from a caller-facing limit where `limit <= 0` means unlimited.
    pub fn new(sort: &[Sort], limit: i64) -> Self {
        Self {
            sort: sort.to_vec(),
            limit: u64::try_from(limit).ok().filter(|limit| *limit > 0),
        }
    }
}

/// What a single-document write touched.
///
/// Zero matches are not an error; callers that care can inspect this
/// through the backend directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Documents that matched the filter (0 or 1).
    pub matched: u64,
    /// Documents that were changed or removed (0 or 1).
    pub affected: u64,
}

impl WriteSummary {
    pub fn is_noop(&self) -> bool {
        self.matched == 0
    }
}

/// The field to read in a single-field lookup and the filter selecting the document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLookup {
    pub filter: DataMap,
    pub field: String,
}

impl FieldLookup {
    /// Returns `true` when the filter asks for a full text search, so a
    /// relevance score is available to rank matches.
    pub fn is_text_search(&self) -> bool {
        self.filter.contains_key("$text")
    }
}
