//! `camp-registrations` validates a spreadsheet of camp registration submissions and detects
//! likely sibling groups.
//!
//! The primary entrypoint is [`process`], which loads the `Registrations` sheet of a workbook,
//! checks every record, groups registrations by guardian email, and writes two sheets back into
//! the workbook:
//!
//! - **`Invalid_Registrations`**: every record with at least one issue, with its display row
//!   number and the issues joined by `" | "`
//! - **`Possible_Siblings`**: guardian emails shared by two or more children
//!
//! ## Validation rules
//!
//! Rules run in a fixed order and all triggered issues are kept:
//!
//! 1. **Required fields**: child name, parent name, parent email and phone must be non-blank
//!    (`Missing parent email`)
//! 2. **Email format**: mailbox syntax only, no DNS (`Invalid email format: ...`)
//! 3. **Age range**: integer within the configured bounds (`Age 3 below minimum (5)`,
//!    `Invalid age value: N/A`)
//! 4. **Duplicates**: same child name and guardian email as an earlier record, compared
//!    case-insensitively (`Duplicate of row 7`)
//!
//! Columns are matched by exact header first, then by case-insensitive substring, so
//! `"Parent Email Address"` still resolves the parent email field. A rule whose column cannot be
//! found is skipped.
//!
//! Row numbers are always **display rows**: what a person sees in the spreadsheet. With the
//! header on the first sheet row that is the 0-based record index plus 2. Blank rows between
//! records are kept as records, so numbering never drifts from the sheet.
//!
//! ## Quick example
//!
//! ```no_run
//! use camp_registrations::{ProcessingOptions, process_with};
//!
//! # fn main() -> Result<(), camp_registrations::ProcessingError> {
//! let options = ProcessingOptions {
//!     output: Some("registrations-checked.xlsx".into()),
//!     ..Default::default()
//! };
//! let summary = process_with("registrations.xlsx", &options)?;
//! println!(
//!     "valid={} ({}%) invalid={} families={}",
//!     summary.valid_count,
//!     summary.valid_percentage(),
//!     summary.invalid_count,
//!     summary.sibling_stats.total_families_with_siblings,
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: the orchestrator ([`process`], [`process_with`], [`pipeline::analyze`])
//! - [`processing`]: column resolution, validation, duplicate and sibling detection
//! - [`ingestion`]: workbook loading
//! - [`observer`]: run outcome hooks ([`observer::TracingObserver`] by default)
//! - [`export`]: writing result sheets while preserving existing ones
//! - [`config`]: header names, required fields, age bounds and sheet names
//! - [`types`]: the in-memory table
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod observer;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use config::ProcessingConfig;
pub use error::{ProcessingError, ProcessingResult};
pub use pipeline::{ProcessingOptions, ProcessingSummary, process, process_with};
