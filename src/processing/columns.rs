//! Column resolution: maps logical fields to the headers actually present in a sheet.

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::{LogicalField, ProcessingConfig};
use crate::types::Table;

/// A logical field matched to a concrete column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Header text as it appears in the sheet.
    pub name: String,
    /// 0-based column index.
    pub index: usize,
}

/// How a field was resolved. Used for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Substring,
}

/// Mapping from every logical field to its column, or `None` when unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMap {
    columns: BTreeMap<LogicalField, Option<ResolvedColumn>>,
}

impl ColumnMap {
    /// Column for `field`, or `None` if the field is unresolved.
    pub fn get(&self, field: LogicalField) -> Option<&ResolvedColumn> {
        self.columns.get(&field).and_then(Option::as_ref)
    }

    /// Column index for `field`, or `None` if the field is unresolved.
    pub fn index(&self, field: LogicalField) -> Option<usize> {
        self.get(field).map(|c| c.index)
    }

    pub fn is_resolved(&self, field: LogicalField) -> bool {
        self.get(field).is_some()
    }

    /// Fields that could not be matched to any column.
    pub fn unresolved(&self) -> Vec<LogicalField> {
        self.columns
            .iter()
            .filter(|(_, c)| c.is_none())
            .map(|(f, _)| *f)
            .collect()
    }

    /// Iterate over every field in the map.
    pub fn iter(&self) -> impl Iterator<Item = (LogicalField, Option<&ResolvedColumn>)> {
        self.columns.iter().map(|(f, c)| (*f, c.as_ref()))
    }
}

/// Resolve the logical fields of `config` against the headers of `table`.
///
/// For each field the exact header wins; otherwise the first header (in sheet order) that
/// contains the expected name case-insensitively; otherwise the field is unresolved. This never
/// fails. Substitutions and misses are logged.
pub fn resolve_columns(table: &Table, config: &ProcessingConfig) -> ColumnMap {
    resolve_headers(&table.headers, config)
}

/// Same as [`resolve_columns`] but over a bare header list.
pub fn resolve_headers(headers: &[String], config: &ProcessingConfig) -> ColumnMap {
    let mut columns = BTreeMap::new();
    for field in LogicalField::ALL {
        let resolved = match config.expected_header(field) {
            Some(expected) => match find_header(headers, expected) {
                Some((column, MatchKind::Exact)) => Some(column),
                Some((column, MatchKind::Substring)) => {
                    warn!(
                        field = field.key(),
                        expected,
                        actual = %column.name,
                        "using similar column name"
                    );
                    Some(column)
                }
                None => {
                    warn!(field = field.key(), expected, "column not found");
                    None
                }
            },
            None => None,
        };
        columns.insert(field, resolved);
    }
    ColumnMap { columns }
}

fn find_header(headers: &[String], expected: &str) -> Option<(ResolvedColumn, MatchKind)> {
    if let Some(index) = headers.iter().position(|h| h == expected) {
        return Some((
            ResolvedColumn {
                name: headers[index].clone(),
                index,
            },
            MatchKind::Exact,
        ));
    }

    let needle = expected.to_lowercase();
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(&needle))
        .map(|index| {
            (
                ResolvedColumn {
                    name: headers[index].clone(),
                    index,
                },
                MatchKind::Substring,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::resolve_headers;
    use crate::config::{LogicalField, ProcessingConfig};

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_wins_over_earlier_substring() {
        let hs = headers(&["Parent Email Address", "Parent Email"]);
        let map = resolve_headers(&hs, &ProcessingConfig::default());
        let col = map.get(LogicalField::ParentEmail).unwrap();
        assert_eq!(col.name, "Parent Email");
        assert_eq!(col.index, 1);
    }

    #[test]
    fn substring_match_is_case_insensitive_and_first_in_order() {
        let hs = headers(&["Timestamp", "CHILD AGE (years)", "child age at camp"]);
        let map = resolve_headers(&hs, &ProcessingConfig::default());
        let col = map.get(LogicalField::ChildAge).unwrap();
        assert_eq!(col.name, "CHILD AGE (years)");
        assert_eq!(col.index, 1);
    }

    #[test]
    fn missing_fields_are_unresolved() {
        let hs = headers(&["Child Full Name", "Parent Email"]);
        let map = resolve_headers(&hs, &ProcessingConfig::default());
        assert!(map.is_resolved(LogicalField::ChildName));
        assert!(!map.is_resolved(LogicalField::Phone));
        assert_eq!(map.index(LogicalField::ChildAge), None);
        let unresolved = map.unresolved();
        assert_eq!(unresolved.len(), LogicalField::ALL.len() - 2);
        assert!(unresolved.contains(&LogicalField::Timestamp));
    }

    #[test]
    fn empty_headers_resolve_nothing() {
        let map = resolve_headers(&[], &ProcessingConfig::default());
        assert_eq!(map.iter().count(), LogicalField::ALL.len());
        assert!(map.iter().all(|(_, c)| c.is_none()));
    }

    #[test]
    fn fields_without_expected_header_stay_unresolved() {
        let mut cfg = ProcessingConfig::default();
        cfg.columns.remove(&LogicalField::Phone);
        let map = resolve_headers(&headers(&["Phone Number"]), &cfg);
        assert!(!map.is_resolved(LogicalField::Phone));
    }
}
