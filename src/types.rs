//! Core data model types.
//!
//! A registration sheet is loaded into an in-memory [`Table`]: an ordered list of column headers
//! plus row-major [`Cell`] storage. Each row is one registration record, identified by its
//! 0-based position in the table. Blank sheet rows between records are kept as records so that
//! row numbers keep matching the sheet.

use serde::Serialize;

/// Offset between a 0-based record index and the row number a person sees in the spreadsheet
/// (1-based rows plus the header row), for a header on the first sheet row.
pub const DISPLAY_ROW_OFFSET: usize = 2;

/// A single spreadsheet cell.
///
/// Serializes untagged: `null`, a string, or a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing/empty cell.
    Empty,
    /// Text value, stored exactly as read.
    Text(String),
    /// Numeric value.
    Number(f64),
}

impl Cell {
    /// Create a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns `true` for empty cells and text that is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Returns the value as it should be shown to a person, or `None` for a blank cell.
    ///
    /// Integral numbers are rendered without a fractional part (`7`, not `7.0`).
    pub fn display_value(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string())
    }

    /// Trimmed, lowercased form used for case-insensitive comparisons.
    pub fn normalized(&self) -> Option<String> {
        self.display_value().map(|s| s.trim().to_lowercase())
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
        }
    }
}

/// In-memory registration table.
///
/// Rows are stored as `Vec<Vec<Cell>>` in the same order as [`Table::headers`]. Rows shorter
/// than the header list are treated as if padded with [`Cell::Empty`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column headers in sheet order.
    pub headers: Vec<String>,
    /// Row-major cell storage.
    pub rows: Vec<Vec<Cell>>,
    /// 0-based sheet row holding the headers. Records follow on the next rows.
    pub header_row: usize,
}

impl Table {
    /// Create a table whose headers sit on the first sheet row.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            headers,
            rows,
            header_row: 0,
        }
    }

    /// Set the 0-based sheet row of the header.
    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    /// Row number a person sees in the sheet for the record at `index`.
    pub fn display_row(&self, index: usize) -> usize {
        index + self.header_row + DISPLAY_ROW_OFFSET
    }

    /// Number of records in the table.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the index of a column by exact header name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (`row`, `column`). Out-of-range positions read as [`Cell::Empty`].
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(EMPTY)
    }

    /// Iterate records with their 0-based index.
    pub fn records(&self) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }
}
