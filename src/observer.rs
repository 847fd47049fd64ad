//! Hooks for hearing about registration runs.
//!
//! Every [`crate::pipeline::Pipeline::run`] ends in exactly one callback: `on_success` with the
//! run's counts, or `on_failure` (plus `on_alert` once the failure reaches the configured
//! threshold). [`TracingObserver`] is installed by default; wrap it in an [`ObserverSet`] next to
//! your own observer to keep the log lines and also record or forward outcomes.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::ProcessingError;
use crate::pipeline::ProcessingSummary;

/// How serious a failed run is.
///
/// `Error` means the workbook needs fixing by whoever maintains the form export. `Critical` means
/// the run could not touch the files at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Critical,
}

impl Severity {
    /// Severity assigned to a failed run.
    pub fn of(e: &ProcessingError) -> Self {
        match e {
            ProcessingError::SourceNotFound { .. }
            | ProcessingError::Io(_)
            | ProcessingError::Xlsx(_) => Severity::Critical,
            ProcessingError::SheetNotFound { .. }
            | ProcessingError::EmptySheet { .. }
            | ProcessingError::Excel(_)
            | ProcessingError::Config(_) => Severity::Error,
        }
    }
}

/// Which workbooks a run reads and writes.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl RunContext {
    /// `true` when the result sheets go into the input workbook itself.
    pub fn writes_in_place(&self) -> bool {
        self.input == self.output
    }
}

/// Counts from a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub registrations: usize,
    pub valid: usize,
    pub invalid: usize,
    pub sibling_groups: usize,
    pub children_in_sibling_groups: usize,
}

impl RunStats {
    /// A non-empty sheet where nothing passed usually means the form's columns were renamed.
    pub fn nothing_valid(&self) -> bool {
        self.registrations > 0 && self.valid == 0
    }
}

impl From<&ProcessingSummary> for RunStats {
    fn from(summary: &ProcessingSummary) -> Self {
        Self {
            registrations: summary.total_registrations,
            valid: summary.valid_count,
            invalid: summary.invalid_count,
            sibling_groups: summary.sibling_stats.total_families_with_siblings,
            children_in_sibling_groups: summary.sibling_stats.total_children_in_sibling_groups,
        }
    }
}

/// Receives the outcome of each registration run.
pub trait RunObserver: Send + Sync {
    fn on_success(&self, _ctx: &RunContext, _stats: RunStats) {}

    fn on_failure(&self, _ctx: &RunContext, _severity: Severity, _error: &ProcessingError) {}

    /// Called after `on_failure` when the severity meets the alert threshold.
    ///
    /// Defaults to calling [`Self::on_failure`] again.
    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &ProcessingError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Several observers behind one, called in insertion order.
///
/// ```
/// use std::sync::Arc;
/// use camp_registrations::observer::{ObserverSet, TracingObserver};
///
/// let observers = ObserverSet::default().with(Arc::new(TracingObserver));
/// assert_eq!(observers.len(), 1);
/// ```
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RunObserver>>,
}

impl ObserverSet {
    pub fn with(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl RunObserver for ObserverSet {
    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &ProcessingError) {
        self.observers.iter().for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &ProcessingError) {
        self.observers.iter().for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Logs run outcomes as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        if stats.nothing_valid() {
            warn!(
                input = %ctx.input.display(),
                registrations = stats.registrations,
                "no registration passed validation; check the sheet's column headers"
            );
        }
        info!(
            input = %ctx.input.display(),
            output = %ctx.output.display(),
            in_place = ctx.writes_in_place(),
            registrations = stats.registrations,
            valid = stats.valid,
            invalid = stats.invalid,
            families = stats.sibling_groups,
            children = stats.children_in_sibling_groups,
            "registrations processed"
        );
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &ProcessingError) {
        error!(?severity, input = %ctx.input.display(), %error, "registration run failed");
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &ProcessingError) {
        error!(
            alert = true,
            ?severity,
            input = %ctx.input.display(),
            output = %ctx.output.display(),
            %error,
            "registration run needs attention"
        );
    }
}
