use std::sync::{Arc, Mutex};

use camp_registrations::observer::{ObserverSet, RunContext, RunObserver, RunStats, Severity, TracingObserver};
use camp_registrations::{ProcessingError, ProcessingOptions, process_with};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<RunStats>>,
    failures: Mutex<Vec<Severity>>,
    alerts: Mutex<Vec<Severity>>,
}

impl RunObserver for RecordingObserver {
    fn on_success(&self, _ctx: &RunContext, stats: RunStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &RunContext, severity: Severity, _error: &ProcessingError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &RunContext, severity: Severity, _error: &ProcessingError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn tmp_workbook(name: &str, sheet: &str) -> std::path::PathBuf {
    use rust_xlsxwriter::Workbook;

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("camp-registrations-{name}-{nanos}.xlsx"));

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(sheet).unwrap();
    ws.write_string(0, 0, "Child Full Name").unwrap();
    ws.write_string(0, 1, "Parent Email").unwrap();
    ws.write_string(1, 0, "Amy").unwrap();
    ws.write_string(1, 1, "ann@example.com").unwrap();
    ws.write_string(2, 0, "Ben").unwrap();
    ws.write_string(2, 1, "ann@example.com").unwrap();
    wb.save(&path).unwrap();
    path
}

#[test]
fn observer_receives_failure_and_alert_on_missing_workbook() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ProcessingOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    };

    let _ = process_with("tests/fixtures/does_not_exist.xlsx", &opts).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Critical]);
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_without_alert_for_missing_sheet() {
    let path = tmp_workbook("obs-sheet", "Sheet1");
    let obs = Arc::new(RecordingObserver::default());
    let opts = ProcessingOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    };

    let err = process_with(&path, &opts).unwrap_err();
    assert!(matches!(err, ProcessingError::SheetNotFound { .. }));
    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn observer_receives_stats_on_success() {
    let path = tmp_workbook("obs-ok", "Registrations");
    let obs = Arc::new(RecordingObserver::default());
    let opts = ProcessingOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };

    let summary = process_with(&path, &opts).unwrap();
    assert_eq!(summary.invalid_count, 0);
    assert_eq!(
        *obs.successes.lock().unwrap(),
        vec![RunStats {
            registrations: 2,
            valid: 2,
            invalid: 0,
            sibling_groups: 1,
            children_in_sibling_groups: 2,
        }]
    );
    assert!(obs.failures.lock().unwrap().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn tracing_and_recording_observers_run_side_by_side() {
    let path = tmp_workbook("obs-set", "Registrations");
    let obs = Arc::new(RecordingObserver::default());
    let opts = ProcessingOptions {
        observer: Some(Arc::new(
            ObserverSet::default().with(Arc::new(TracingObserver)).with(obs.clone()),
        )),
        ..Default::default()
    };

    process_with(&path, &opts).unwrap();
    assert_eq!(obs.successes.lock().unwrap().len(), 1);

    let _ = std::fs::remove_file(&path);
}
