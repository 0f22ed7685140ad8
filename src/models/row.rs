//! Snapshot and row data structures.

/// One record of the remote sheet, cell values in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Cell value at the given 0-based column index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

impl From<Vec<String>> for Row {
    fn from(values: Vec<String>) -> Self {
        Self::new(values)
    }
}

/// One full read of the remote sheet at a point in time.
///
/// The source guarantees a rectangular table within one snapshot; nothing
/// is assumed stable across snapshots.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Snapshot {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// 0-based index of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A row that passed the status/service filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRow {
    /// 1-based position within the snapshot's data rows
    pub position: usize,

    /// Trimmed identifier, or None when the cell is missing, empty,
    /// or the literal "none" (such rows are never deduplicated)
    pub id: Option<String>,
}

impl MatchedRow {
    /// Row number as displayed in the sheet editor (header row is row 1).
    pub fn sheet_row(&self) -> usize {
        self.position + 1
    }

    /// Identifier for display in alert text.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("Unknown")
    }
}
