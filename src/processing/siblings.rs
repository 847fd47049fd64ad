//! Sibling detection.
//!
//! Registrations sharing a guardian email (trimmed, lowercased) are grouped as one family.
//! Only families with two or more children are reported.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::config::LogicalField;
use crate::processing::columns::ColumnMap;
use crate::processing::email::is_valid_mailbox;
use crate::processing::validate::parse_age;
use crate::types::Table;

/// Registrations that likely belong to one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiblingGroup {
    /// Guardian email as first written in the sheet.
    pub parent_email: String,
    /// Child names in table order.
    pub children_names: Vec<String>,
    /// Display row numbers in table order.
    pub row_numbers: Vec<usize>,
    pub number_of_children: usize,
    /// Sum of parseable ages; `None` when the age column is unresolved. Missing or
    /// non-numeric ages are left out of the sum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_age: Option<i64>,
}

/// Aggregate statistics over all sibling groups.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SiblingStatistics {
    pub total_families_with_siblings: usize,
    pub total_children_in_sibling_groups: usize,
    pub largest_family_size: usize,
    /// Mean group size rounded to two decimals.
    pub average_children_per_family: f64,
}

/// Group registrations by guardian email.
///
/// A record takes part only if both the child name and a syntactically valid guardian email are
/// present. Groups are sorted by descending size; equal sizes keep first-encounter order.
pub fn detect_siblings(table: &Table, columns: &ColumnMap) -> Vec<SiblingGroup> {
    let (Some(email_col), Some(child_col)) = (
        columns.index(LogicalField::ParentEmail),
        columns.index(LogicalField::ChildName),
    ) else {
        warn!("cannot detect siblings: missing email or child name columns");
        return Vec::new();
    };
    let age_col = columns.index(LogicalField::ChildAge);

    let mut order: Vec<String> = Vec::new();
    let mut families: HashMap<String, SiblingGroup> = HashMap::new();

    for (idx, _) in table.records() {
        let (Some(email), Some(child)) = (
            table.cell(idx, email_col).display_value(),
            table.cell(idx, child_col).display_value(),
        ) else {
            continue;
        };
        let key = email.trim().to_lowercase();
        if !is_valid_mailbox(&key) {
            continue;
        }

        let group = families.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            SiblingGroup {
                parent_email: email,
                children_names: Vec::new(),
                row_numbers: Vec::new(),
                number_of_children: 0,
                total_age: age_col.map(|_| 0),
            }
        });
        group.children_names.push(child);
        group.row_numbers.push(table.display_row(idx));
        group.number_of_children += 1;
        if let (Some(total), Some(col)) = (group.total_age.as_mut(), age_col) {
            *total = total.saturating_add(parse_age(table.cell(idx, col)).unwrap_or(0));
        }
    }

    let mut groups: Vec<SiblingGroup> = order
        .into_iter()
        .filter_map(|key| families.remove(&key))
        .filter(|g| g.number_of_children >= 2)
        .collect();
    // Stable: ties keep first-encounter order.
    groups.sort_by(|a, b| b.number_of_children.cmp(&a.number_of_children));
    groups
}

/// Summarize sibling groups. All zeros for an empty slice.
pub fn sibling_statistics(groups: &[SiblingGroup]) -> SiblingStatistics {
    if groups.is_empty() {
        return SiblingStatistics::default();
    }
    let total: usize = groups.iter().map(|g| g.number_of_children).sum();
    let largest = groups
        .iter()
        .map(|g| g.number_of_children)
        .max()
        .unwrap_or(0);
    let mean = total as f64 / groups.len() as f64;
    SiblingStatistics {
        total_families_with_siblings: groups.len(),
        total_children_in_sibling_groups: total,
        largest_family_size: largest,
        average_children_per_family: (mean * 100.0).round() / 100.0,
    }
}
