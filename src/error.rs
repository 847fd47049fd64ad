use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Error type returned by the loader, writer, configuration and pipeline entrypoints.
///
/// Data-quality findings are never errors; they are reported as validation issues on the
/// affected record. Every variant here is fatal to a run.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The input workbook does not exist.
    #[error("registration workbook not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// The expected source sheet is absent from the workbook.
    #[error(
        "sheet '{sheet}' not found in workbook; check the `source` sheet name in the configuration (available sheets: {available:?})"
    )]
    SheetNotFound { sheet: String, available: Vec<String> },

    /// The source sheet contains no header row.
    #[error("sheet '{sheet}' has no non-empty rows (no header row found)")]
    EmptySheet { sheet: String },

    /// Underlying I/O error (e.g. permission denied, failed copy to the output location).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook could not be read.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Results could not be written to the output workbook.
    #[error("failed to write results: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
