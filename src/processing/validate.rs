//! Per-record validation.
//!
//! Each record runs through the rules in a fixed order (required fields, email format, age range,
//! duplicate) and every triggered issue is kept. A rule whose field is unresolved is skipped.

use serde::Serialize;
use tracing::debug;

use crate::config::{LogicalField, ProcessingConfig};
use crate::processing::columns::ColumnMap;
use crate::processing::duplicates::{DuplicateIndex, duplicate_issue};
use crate::processing::email::check_mailbox;
use crate::types::{Cell, Table};

/// Separator used when joining a record's issues for display.
pub const ISSUE_SEPARATOR: &str = " | ";

/// A record that failed at least one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRecord {
    /// Display row number of the record.
    pub row_number: usize,
    /// Issues in rule order.
    pub issues: Vec<String>,
    /// The record's original cells, in column order.
    pub fields: Vec<Cell>,
}

impl InvalidRecord {
    /// Issues joined with [`ISSUE_SEPARATOR`].
    pub fn issues_text(&self) -> String {
        self.issues.join(ISSUE_SEPARATOR)
    }
}

/// Validate every record of `table` and return the invalid ones in table order.
pub fn validate_records(
    table: &Table,
    columns: &ColumnMap,
    config: &ProcessingConfig,
) -> Vec<InvalidRecord> {
    let child_col = columns.index(LogicalField::ChildName);
    let email_col = columns.index(LogicalField::ParentEmail);
    let age_col = columns.index(LogicalField::ChildAge);

    let mut duplicates = DuplicateIndex::new();
    let mut invalid = Vec::new();

    for (idx, record) in table.records() {
        let row_number = table.display_row(idx);
        let mut issues = check_required_fields(table, idx, columns, &config.required_fields);

        if let Some(col) = email_col {
            issues.extend(check_email_format(table.cell(idx, col)));
        }
        if let Some(col) = age_col {
            issues.extend(check_age(table.cell(idx, col), config.min_age, config.max_age));
        }
        if let (Some(child), Some(email)) = (child_col, email_col) {
            if let Some(earlier) =
                duplicates.observe(row_number, table.cell(idx, child), table.cell(idx, email))
            {
                issues.push(duplicate_issue(earlier));
            }
        }

        if !issues.is_empty() {
            debug!(row = row_number, issues = %issues.join(ISSUE_SEPARATOR), "invalid registration");
            let mut fields = record.to_vec();
            fields.resize(table.headers.len().max(fields.len()), Cell::Empty);
            invalid.push(InvalidRecord {
                row_number,
                issues,
                fields,
            });
        }
    }

    invalid
}

/// "Missing {field}" for every required field whose resolved cell is blank.
pub fn check_required_fields(
    table: &Table,
    row: usize,
    columns: &ColumnMap,
    required: &[LogicalField],
) -> Vec<String> {
    required
        .iter()
        .filter_map(|&field| {
            let col = columns.index(field)?;
            table
                .cell(row, col)
                .is_blank()
                .then(|| format!("Missing {}", field.display_name()))
        })
        .collect()
}

/// Mailbox syntax check. Blank values pass; absence is the required-field rule's concern.
pub fn check_email_format(cell: &Cell) -> Option<String> {
    let email = cell.display_value()?;
    check_mailbox(email.trim())
        .err()
        .map(|reason| format!("Invalid email format: {reason}"))
}

/// Age range check. Blank values pass.
pub fn check_age(cell: &Cell, min_age: Option<i64>, max_age: Option<i64>) -> Option<String> {
    if cell.is_blank() {
        return None;
    }
    let Some(age) = parse_age(cell) else {
        return Some(format!("Invalid age value: {cell}"));
    };
    if let Some(min) = min_age.filter(|&min| age < min) {
        return Some(format!("Age {age} below minimum ({min})"));
    }
    if let Some(max) = max_age.filter(|&max| age > max) {
        return Some(format!("Age {age} above maximum ({max})"));
    }
    None
}

/// Integer age from a cell. Numbers truncate toward zero; text must be a whole integer.
pub fn parse_age(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Empty => None,
        Cell::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        Cell::Number(_) => None,
        Cell::Text(s) => s.trim().parse::<i64>().ok(),
    }
}
