//! End-to-end registration processing.
//!
//! Most callers should use [`process`] (results are added to the input workbook) or
//! [`process_with`]. Each call loads its own copy of the table and returns either a complete
//! [`ProcessingSummary`] or an error; nothing is shared between calls.
//!
//! Stages, each logged as `[n/5]`: load → map columns → validate → group siblings (with
//! statistics) → write.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::ProcessingConfig;
use crate::error::ProcessingResult;
use crate::export::{ResultSheets, write_results};
use crate::ingestion::excel::load_registrations;
use crate::observer::{RunContext, RunObserver, RunStats, Severity, TracingObserver};
use crate::processing::{
    ColumnMap, InvalidRecord, SiblingGroup, SiblingStatistics, detect_siblings, resolve_columns,
    sibling_statistics, validate_records,
};
use crate::types::Table;

/// Source of the registration table.
pub trait TableLoader {
    fn load(&self, path: &Path, config: &ProcessingConfig) -> ProcessingResult<Table>;
}

/// Destination for the derived sheets.
///
/// `source` is the workbook the table was loaded from. A writer creating `path` from scratch
/// takes the sheets it keeps from there.
pub trait ResultWriter {
    fn write(
        &self,
        path: &Path,
        source: &Path,
        config: &ProcessingConfig,
        results: ResultSheets<'_>,
    ) -> ProcessingResult<()>;
}

/// Workbook-backed loader and writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelWorkbook;

impl TableLoader for ExcelWorkbook {
    fn load(&self, path: &Path, config: &ProcessingConfig) -> ProcessingResult<Table> {
        load_registrations(path, &config.sheets.source)
    }
}

impl ResultWriter for ExcelWorkbook {
    fn write(
        &self,
        path: &Path,
        source: &Path,
        config: &ProcessingConfig,
        results: ResultSheets<'_>,
    ) -> ProcessingResult<()> {
        write_results(path, source, &config.sheets, results)
    }
}

/// Everything derived from one table, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub columns: ColumnMap,
    pub invalid: Vec<InvalidRecord>,
    pub siblings: Vec<SiblingGroup>,
    pub statistics: SiblingStatistics,
}

/// Run every pure stage over `table`.
pub fn analyze(table: &Table, config: &ProcessingConfig) -> Analysis {
    let columns = resolve_columns(table, config);
    let invalid = validate_records(table, &columns, config);
    let siblings = detect_siblings(table, &columns);
    let statistics = sibling_statistics(&siblings);
    Analysis {
        columns,
        invalid,
        siblings,
        statistics,
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
    pub total_registrations: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub sibling_stats: SiblingStatistics,
    pub output_file: PathBuf,
}

impl ProcessingSummary {
    /// Share of valid registrations in percent, one decimal. Zero for an empty table.
    pub fn valid_percentage(&self) -> f64 {
        percentage(self.valid_count, self.total_registrations)
    }

    /// Share of invalid registrations in percent, one decimal. Zero for an empty table.
    pub fn invalid_percentage(&self) -> f64 {
        percentage(self.invalid_count, self.total_registrations)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Options controlling a run.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ProcessingOptions {
    pub config: ProcessingConfig,
    /// Output workbook. `None` writes the results into the input workbook.
    pub output: Option<PathBuf>,
    /// Observer for logging/alerts. Defaults to [`TracingObserver`].
    pub observer: Option<Arc<dyn RunObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for ProcessingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingOptions")
            .field("config", &self.config)
            .field("output", &self.output)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            config: ProcessingConfig::default(),
            output: None,
            observer: Some(Arc::new(TracingObserver)),
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Process the workbook at `input`, adding the result sheets to it.
///
/// ```no_run
/// # fn main() -> Result<(), camp_registrations::ProcessingError> {
/// let summary = camp_registrations::process("registrations.xlsx")?;
/// println!(
///     "{} registrations, {} invalid, {} families",
///     summary.total_registrations,
///     summary.invalid_count,
///     summary.sibling_stats.total_families_with_siblings,
/// );
/// # Ok(())
/// # }
/// ```
pub fn process(input: impl AsRef<Path>) -> ProcessingResult<ProcessingSummary> {
    process_with(input, &ProcessingOptions::default())
}

/// Process the workbook at `input` with explicit options.
///
/// When `options.output` names a workbook that does not exist yet, it is created with the input
/// workbook's sheets alongside the results. Nothing is created if the run fails.
pub fn process_with(
    input: impl AsRef<Path>,
    options: &ProcessingOptions,
) -> ProcessingResult<ProcessingSummary> {
    Pipeline::new(ExcelWorkbook, ExcelWorkbook, options).run(input.as_ref())
}

/// Pipeline over an arbitrary loader and writer.
pub struct Pipeline<'a, L, W> {
    loader: L,
    writer: W,
    options: &'a ProcessingOptions,
}

impl<'a, L: TableLoader, W: ResultWriter> Pipeline<'a, L, W> {
    pub fn new(loader: L, writer: W, options: &'a ProcessingOptions) -> Self {
        Self {
            loader,
            writer,
            options,
        }
    }

    /// Run all stages for `input`, reporting the outcome to the configured observer.
    pub fn run(&self, input: &Path) -> ProcessingResult<ProcessingSummary> {
        let ctx = RunContext {
            input: input.to_path_buf(),
            output: self.options.output.clone().unwrap_or_else(|| input.to_path_buf()),
        };

        let result = self.run_stages(&ctx);

        if let Some(obs) = self.options.observer.as_ref() {
            match &result {
                Ok(summary) => obs.on_success(&ctx, RunStats::from(summary)),
                Err(e) => {
                    let sev = Severity::of(e);
                    obs.on_failure(&ctx, sev, e);
                    if sev >= self.options.alert_at_or_above {
                        obs.on_alert(&ctx, sev, e);
                    }
                }
            }
        }

        result
    }

    fn run_stages(&self, ctx: &RunContext) -> ProcessingResult<ProcessingSummary> {
        let config = &self.options.config;

        info!(
            input = %ctx.input.display(),
            sheet = %config.sheets.source,
            "[1/5] loading registration data"
        );
        let table = self.loader.load(&ctx.input, config)?;
        let total = table.row_count();
        info!(registrations = total, "loaded registrations");

        info!("[2/5] mapping columns");
        let columns = resolve_columns(&table, config);
        info!(unresolved = columns.unresolved().len(), "columns mapped");

        info!("[3/5] validating registrations");
        let invalid = validate_records(&table, &columns, config);
        let invalid_count = invalid.len();
        info!(valid = total - invalid_count, invalid = invalid_count, "validation complete");

        info!("[4/5] detecting siblings");
        let siblings = detect_siblings(&table, &columns);
        let statistics = sibling_statistics(&siblings);
        info!(
            families = statistics.total_families_with_siblings,
            children = statistics.total_children_in_sibling_groups,
            "sibling detection complete"
        );

        info!(output = %ctx.output.display(), "[5/5] writing results");
        self.writer.write(
            &ctx.output,
            &ctx.input,
            config,
            ResultSheets {
                headers: &table.headers,
                invalid: &invalid,
                siblings: &siblings,
            },
        )?;

        Ok(ProcessingSummary {
            total_registrations: total,
            valid_count: total - invalid_count,
            invalid_count,
            sibling_stats: statistics,
            output_file: ctx.output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use super::{
        Pipeline, ProcessingOptions, ResultSheets, ResultWriter, TableLoader, analyze, percentage,
    };
    use crate::config::ProcessingConfig;
    use crate::error::{ProcessingError, ProcessingResult};
    use crate::types::{Cell, Table};

    struct InMemory(Table);

    impl TableLoader for InMemory {
        fn load(&self, _path: &Path, _config: &ProcessingConfig) -> ProcessingResult<Table> {
            Ok(self.0.clone())
        }
    }

    struct MissingSheet;

    impl TableLoader for MissingSheet {
        fn load(&self, _path: &Path, config: &ProcessingConfig) -> ProcessingResult<Table> {
            Err(ProcessingError::SheetNotFound {
                sheet: config.sheets.source.clone(),
                available: vec!["Form Responses 1".to_string()],
            })
        }
    }

    #[derive(Default, Clone)]
    struct Recording {
        writes: Arc<Mutex<Vec<(PathBuf, usize, usize)>>>,
        fail: bool,
    }

    impl ResultWriter for Recording {
        fn write(
            &self,
            path: &Path,
            _source: &Path,
            _config: &ProcessingConfig,
            results: ResultSheets<'_>,
        ) -> ProcessingResult<()> {
            if self.fail {
                return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into());
            }
            self.writes.lock().unwrap().push((
                path.to_path_buf(),
                results.invalid.len(),
                results.siblings.len(),
            ));
            Ok(())
        }
    }

    fn sample() -> Table {
        let headers = ["Child Full Name", "Child Age", "Parent/Guardian Name", "Parent Email", "Phone Number"];
        let rows = [
            ("Amy", 7.0, "a@example.com"),
            ("Ben", 8.0, "a@example.com"),
            ("Cal", 6.0, "b@example.com"),
            ("Dan", 9.0, "a@example.com"),
            ("Eve", 5.0, "c@example.com"),
            ("Fay", 10.0, "c@example.com"),
            ("Gus", 3.0, "not-an-email"),
        ];
        Table::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|(child, age, email)| {
                    vec![
                        Cell::text(*child),
                        Cell::Number(*age),
                        Cell::text("Parent"),
                        Cell::text(*email),
                        Cell::text("555-0100"),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn summary_counts_add_up_and_results_are_written_once() {
        let writer = Recording::default();
        let options = ProcessingOptions::default();
        let summary = Pipeline::new(InMemory(sample()), writer.clone(), &options)
            .run(Path::new("camp.xlsx"))
            .unwrap();

        assert_eq!(summary.total_registrations, 7);
        assert_eq!(summary.invalid_count, 1);
        assert_eq!(summary.valid_count, 6);
        assert_eq!(summary.sibling_stats.total_families_with_siblings, 2);
        assert_eq!(summary.sibling_stats.total_children_in_sibling_groups, 5);
        assert_eq!(summary.sibling_stats.largest_family_size, 3);
        assert_eq!(summary.sibling_stats.average_children_per_family, 2.5);
        assert_eq!(summary.output_file, PathBuf::from("camp.xlsx"));
        assert_eq!(
            *writer.writes.lock().unwrap(),
            vec![(PathBuf::from("camp.xlsx"), 1, 2)]
        );
    }

    #[test]
    fn load_failure_stops_before_writing() {
        let writer = Recording::default();
        let options = ProcessingOptions::default();
        let err = Pipeline::new(MissingSheet, writer.clone(), &options)
            .run(Path::new("camp.xlsx"))
            .unwrap_err();
        assert!(err.to_string().contains("Form Responses 1"));
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn write_failure_returns_no_summary() {
        let writer = Recording {
            fail: true,
            ..Default::default()
        };
        let options = ProcessingOptions::default();
        let err = Pipeline::new(InMemory(sample()), writer, &options)
            .run(Path::new("camp.xlsx"))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Io(_)));
    }

    #[test]
    fn failed_write_leaves_no_output_workbook() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("camp_failed_write_in_{}.xlsx", std::process::id()));
        let output = dir.join(format!("camp_failed_write_out_{}.xlsx", std::process::id()));
        std::fs::write(&input, b"source workbook").unwrap();
        let _ = std::fs::remove_file(&output);

        let writer = Recording {
            fail: true,
            ..Default::default()
        };
        let options = ProcessingOptions {
            output: Some(output.clone()),
            ..Default::default()
        };
        let result = Pipeline::new(InMemory(sample()), writer, &options).run(&input);

        assert!(result.is_err());
        assert!(!output.exists());
        let _ = std::fs::remove_file(&input);
    }

    #[test]
    fn default_options_log_through_tracing() {
        let options = ProcessingOptions::default();
        assert!(options.observer.is_some());
        assert!(format!("{options:?}").contains("observer_set: true"));
    }

    #[test]
    fn analysis_is_deterministic() {
        let table = sample();
        let cfg = ProcessingConfig::default();
        assert_eq!(analyze(&table, &cfg), analyze(&table, &cfg));
    }

    #[test]
    fn summary_serializes_with_stable_keys() {
        let options = ProcessingOptions::default();
        let summary = Pipeline::new(InMemory(sample()), Recording::default(), &options)
            .run(Path::new("camp.xlsx"))
            .unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_registrations"], 7);
        assert_eq!(json["sibling_stats"]["largest_family_size"], 3);
        assert_eq!(json["output_file"], "camp.xlsx");
    }

    #[test]
    fn percentages_round_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
