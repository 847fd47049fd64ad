//! Validation and grouping over an in-memory registration [`crate::types::Table`].
//!
//! Every function here is pure: it reads the table, the [`columns::ColumnMap`] and the
//! [`crate::config::ProcessingConfig`], and returns new values.
//!
//! - [`resolve_columns()`]: logical field → actual header
//! - [`validate_records()`]: per-record rule checks, including duplicates
//! - [`detect_siblings()`] and [`sibling_statistics()`]: family grouping
//!
//! ## Example
//!
//! ```rust
//! use camp_registrations::config::ProcessingConfig;
//! use camp_registrations::processing::{detect_siblings, resolve_columns, validate_records};
//! use camp_registrations::types::{Cell, Table};
//!
//! let table = Table::new(
//!     vec!["Child Full Name".into(), "Child Age".into(), "Parent Email".into()],
//!     vec![
//!         vec![Cell::text("Amy"), Cell::Number(7.0), Cell::text("ann@example.com")],
//!         vec![Cell::text("Ben"), Cell::Number(3.0), Cell::text("ann@example.com")],
//!     ],
//! );
//! let config = ProcessingConfig::default();
//! let columns = resolve_columns(&table, &config);
//!
//! let invalid = validate_records(&table, &columns, &config);
//! assert_eq!(invalid.len(), 1);
//! assert_eq!(invalid[0].issues_text(), "Age 3 below minimum (5)");
//!
//! let families = detect_siblings(&table, &columns);
//! assert_eq!(families[0].row_numbers, vec![2, 3]);
//! ```

pub mod columns;
pub mod duplicates;
pub mod email;
pub mod siblings;
pub mod validate;

pub use columns::{ColumnMap, ResolvedColumn, resolve_columns};
pub use siblings::{SiblingGroup, SiblingStatistics, detect_siblings, sibling_statistics};
pub use validate::{ISSUE_SEPARATOR, InvalidRecord, validate_records};
