//! Duplicate registration detection.
//!
//! Two records are duplicates when both the child name and the guardian email match after
//! trimming and lowercasing. Each record is compared against every earlier record; the earliest
//! match is the one reported.

use std::collections::HashMap;

use crate::types::Cell;

/// Tracks the earliest display row seen for each normalized (child name, guardian email) pair.
///
/// Records must be observed in table order. Looking up before inserting gives the
/// "first match among earlier records" answer in O(1) per record.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    first_seen: HashMap<(String, String), usize>,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a record and return the display row of the earliest earlier record with the same
    /// key, if any. Records missing either value are ignored.
    pub fn observe(&mut self, display_row: usize, child_name: &Cell, guardian_email: &Cell) -> Option<usize> {
        let key = (child_name.normalized()?, guardian_email.normalized()?);
        match self.first_seen.get(&key) {
            Some(&earlier) => Some(earlier),
            None => {
                self.first_seen.insert(key, display_row);
                None
            }
        }
    }
}

/// Issue text for a duplicate of `earlier_row`.
pub fn duplicate_issue(earlier_row: usize) -> String {
    format!("Duplicate of row {earlier_row}")
}
