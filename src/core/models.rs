//! Core data models: the typed export document and workload keys

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Separator joining table name, row index and field name into a workload key.
/// Table names must never contain this sequence; field names come from the
/// allow-list and cannot.
pub const KEY_SEPARATOR: &str = "::";

/// Row record: field name mapped to a scalar JSON value, order preserved
pub type Row = serde_json::Map<String, Value>;

/// One table of the export: ordered rows plus sibling keys passed through verbatim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Ordered row records; a table without a `rows` key stays without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,

    /// Other table descriptor keys, round-tripped unmodified
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The export document: table name mapped to its descriptor, order preserved.
/// Loaded once, mutated in place through [`Document::update_field`], written once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    /// Tables by name, in file order
    pub tables: IndexMap<String, Table>,
}

impl Document {
    /// Overwrite the value at the referenced field with translated text.
    ///
    /// Returns `false` without touching the document when the table, row or
    /// field cannot be found; rows are never added and fields never created.
    pub fn update_field(&mut self, field_ref: &FieldRef, text: String) -> bool {
        let rows = match self
            .tables
            .get_mut(&field_ref.table)
            .and_then(|t| t.rows.as_mut())
        {
            Some(rows) => rows,
            None => return false,
        };

        let row = match rows.get_mut(field_ref.row) {
            Some(row) => row,
            None => return false,
        };

        match row.get_mut(&field_ref.field) {
            Some(slot) => {
                *slot = Value::String(text);
                true
            }
            None => false,
        }
    }
}

/// Location of one translatable field: (table, row index, field name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// Table name
    pub table: String,
    /// Zero-based row index within the table's row sequence
    pub row: usize,
    /// Field name within the row
    pub field: String,
}

impl FieldRef {
    /// Create a reference to a (table, row, field) location
    pub fn new(table: impl Into<String>, row: usize, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row,
            field: field.into(),
        }
    }

    /// Build the workload key for this location
    pub fn key(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.table,
            self.row,
            self.field,
            sep = KEY_SEPARATOR
        )
    }

    /// Decompose a workload key back into the location that produced it.
    ///
    /// Splits from the right so the field and index are unambiguous; returns
    /// `None` for keys that do not have the three-part shape.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.rsplitn(3, KEY_SEPARATOR);
        let field = parts.next()?;
        let row = parts.next()?.parse::<usize>().ok()?;
        let table = parts.next()?;

        if table.is_empty() || field.is_empty() {
            return None;
        }

        Some(Self::new(table, row, field))
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Flattened translation workload extracted from a document
#[derive(Debug, Default)]
pub struct Workload {
    /// (key, source text) pairs in table-then-row-then-field order
    pub items: Vec<(String, String)>,
    /// Reverse mapping from key back to its document location
    pub index: HashMap<String, FieldRef>,
}

impl Workload {
    /// Number of translatable items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the document had nothing to translate
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Token counts reported by the service for one request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenCounts {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
    #[serde(default)]
    pub total_tokens: usize,
}

/// Accumulated usage over a translation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReport {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
    pub batches_succeeded: usize,
    pub batches_failed: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl UsageReport {
    /// Start an empty report stamped with the current time
    pub fn new() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            batches_succeeded: 0,
            batches_failed: 0,
            started_at: chrono::Utc::now(),
        }
    }

    /// Record a successfully translated batch
    pub fn record_success(&mut self, counts: TokenCounts) {
        self.prompt_tokens += counts.prompt_tokens;
        self.completion_tokens += counts.completion_tokens;
        self.total_tokens += counts.total_tokens;
        self.batches_succeeded += 1;
    }

    /// Record a batch that exhausted its retries
    pub fn record_failure(&mut self) {
        self.batches_failed += 1;
    }

    /// Total batches attempted
    pub fn batches_total(&self) -> usize {
        self.batches_succeeded + self.batches_failed
    }
}

impl Default for UsageReport {
    fn default() -> Self {
        Self::new()
    }
}
