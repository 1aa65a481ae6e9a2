use super::*;
use crate::catalog::default_catalog;
use crate::error::MedicError;
use crate::provider::{CleanupStats, ServiceState, ServiceStatus};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Provider whose capabilities all succeed and which records every call.
#[derive(Clone, Default)]
struct StubProvider {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl StubProvider {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn note(&self, capability: &'static str) {
        self.calls.lock().unwrap().push(capability);
    }
}

impl MaintenanceProvider for StubProvider {
    type Error = MedicError;

    fn system_summary(&self) -> Result<String, Self::Error> {
        self.note("system_summary");
        Ok("OS: Windows 11 Pro 23H2\nMemory: 16204 MB".into())
    }

    fn create_restore_point(&self, description: &str) -> Result<String, Self::Error> {
        self.note("create_restore_point");
        Ok(format!("Restore point `{description}` created"))
    }

    fn verify_system_files(&self) -> Result<String, Self::Error> {
        self.note("verify_system_files");
        Ok("No integrity violations found".into())
    }

    fn scan_disk(&self, drive: &str) -> Result<String, Self::Error> {
        self.note("scan_disk");
        Ok(format!("{drive} scanned, no errors"))
    }

    fn reset_update_components(
        &self,
        _services: &[String],
        _cache_dirs: &[PathBuf],
    ) -> Result<Vec<String>, Self::Error> {
        self.note("reset_update_components");
        Ok(vec!["Stopped wuauserv".into(), "Started wuauserv".into()])
    }

    fn reset_network_stack(&self) -> Result<Vec<String>, Self::Error> {
        self.note("reset_network_stack");
        Ok(vec!["Winsock catalog reset".into()])
    }

    fn rebuild_icon_cache(&self) -> Result<String, Self::Error> {
        self.note("rebuild_icon_cache");
        Ok("Icon cache cleared".into())
    }

    fn reregister_store_apps(&self) -> Result<String, Self::Error> {
        self.note("reregister_store_apps");
        Ok("Store applications re-registered".into())
    }

    fn repair_store_cache(&self) -> Result<String, Self::Error> {
        self.note("repair_store_cache");
        Ok("Store cache reset".into())
    }

    fn repair_system_image(&self) -> Result<String, Self::Error> {
        self.note("repair_system_image");
        Ok("Component store healthy".into())
    }

    fn disk_usage(&self, drive: &str) -> Result<String, Self::Error> {
        self.note("disk_usage");
        Ok(format!("{drive} has 120 GB free of 512 GB"))
    }

    fn clean_temp_files(&self, _extra_dirs: &[PathBuf]) -> Result<CleanupStats, Self::Error> {
        self.note("clean_temp_files");
        Ok(CleanupStats {
            removed: 4,
            freed_bytes: 8192,
            skipped: 1,
        })
    }

    fn export_update_log(&self, destination: &Path) -> Result<PathBuf, Self::Error> {
        self.note("export_update_log");
        Ok(destination.to_path_buf())
    }

    fn service_health(&self, services: &[String]) -> Result<Vec<ServiceStatus>, Self::Error> {
        self.note("service_health");
        Ok(services
            .iter()
            .map(|name| ServiceStatus {
                name: name.clone(),
                state: ServiceState::Running,
            })
            .collect())
    }
}

/// Provider whose every capability reports the external tool failing.
#[derive(Clone, Default)]
struct FailingProvider;

impl FailingProvider {
    fn refused<T>(&self) -> Result<T, MedicError> {
        Err(MedicError::Provider(
            "external capability refused the request".into(),
        ))
    }
}

impl MaintenanceProvider for FailingProvider {
    type Error = MedicError;

    fn system_summary(&self) -> Result<String, Self::Error> {
        self.refused()
    }

    fn create_restore_point(&self, _description: &str) -> Result<String, Self::Error> {
        self.refused()
    }

    fn verify_system_files(&self) -> Result<String, Self::Error> {
        self.refused()
    }

    fn scan_disk(&self, _drive: &str) -> Result<String, Self::Error> {
        self.refused()
    }

    fn reset_update_components(
        &self,
        _services: &[String],
        _cache_dirs: &[PathBuf],
    ) -> Result<Vec<String>, Self::Error> {
        self.refused()
    }

    fn reset_network_stack(&self) -> Result<Vec<String>, Self::Error> {
        self.refused()
    }

    fn rebuild_icon_cache(&self) -> Result<String, Self::Error> {
        self.refused()
    }

    fn reregister_store_apps(&self) -> Result<String, Self::Error> {
        self.refused()
    }

    fn repair_store_cache(&self) -> Result<String, Self::Error> {
        self.refused()
    }

    fn repair_system_image(&self) -> Result<String, Self::Error> {
        self.refused()
    }

    fn disk_usage(&self, _drive: &str) -> Result<String, Self::Error> {
        self.refused()
    }

    fn clean_temp_files(&self, _extra_dirs: &[PathBuf]) -> Result<CleanupStats, Self::Error> {
        self.refused()
    }

    fn export_update_log(&self, _destination: &Path) -> Result<PathBuf, Self::Error> {
        self.refused()
    }

    fn service_health(&self, _services: &[String]) -> Result<Vec<ServiceStatus>, Self::Error> {
        self.refused()
    }
}

/// Run a whole scripted session and return (console output, log contents).
fn run_console<P: MaintenanceProvider>(provider: &P, script: &str) -> (String, String) {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("session.log");
    let catalog = default_catalog().unwrap();
    let config = MedicConfig::default();
    let mut audit = AuditLog::at_path(&log_path).unwrap().with_echo(false);
    let mut console = Vec::new();

    let mut engine = SessionEngine::new(
        &catalog,
        &config,
        provider,
        &mut audit,
        Cursor::new(script.as_bytes().to_vec()),
        &mut console,
    );
    engine.run().expect("session should complete");
    drop(engine);

    let log = fs::read_to_string(&log_path).unwrap();
    (String::from_utf8(console).unwrap(), log)
}

fn count_lines_with(text: &str, needle: &str) -> usize {
    text.lines().filter(|line| line.contains(needle)).count()
}

/// Summary entries in the log file are the unprefixed `[ok]`/`[failed]`/
/// `[cancelled]` lines between the heading and the closing entry.
fn summary_entries(log: &str) -> Vec<&str> {
    log.lines()
        .filter(|line| {
            line.starts_with("[ok]") || line.starts_with("[failed]") || line.starts_with("[cancelled]")
        })
        .collect()
}

#[test]
fn informational_operation_success() {
    let provider = StubProvider::default();
    let (console, log) = run_console(&provider, "1\n\nq\n");

    assert_eq!(provider.calls(), vec!["system_summary"]);
    assert!(console.contains("==== Show system summary ===="));
    assert!(console.contains("OS: Windows 11 Pro 23H2"));
    assert!(console.contains("SUCCESS: Show system summary"));
    // no confirmation for informational operations
    assert!(!console.contains("Proceed?"));
    // loop returned to the menu before quitting
    assert_eq!(count_lines_with(&console, "Select an option"), 2);

    assert_eq!(count_lines_with(&log, "[INFO] Show system summary completed"), 1);
    assert_eq!(count_lines_with(&log, "[ERROR]"), 0);
    assert_eq!(summary_entries(&log), vec!["[ok] Show system summary"]);
}

#[test]
fn declined_confirmation_cancels_without_running() {
    for answer in ["n", "", "yes", "ok"] {
        let provider = StubProvider::default();
        let script = format!("5\n{answer}\n\nq\n");
        let (console, log) = run_console(&provider, &script);

        assert!(
            provider.calls().is_empty(),
            "body must not run for answer {answer:?}"
        );
        assert!(console.contains("CANCELLED: Reset Windows Update components"));
        assert_eq!(
            count_lines_with(
                &log,
                "[WARN] Action cancelled by operator: Reset Windows Update components"
            ),
            1,
            "answer {answer:?}"
        );
        assert_eq!(count_lines_with(&log, "[ERROR]"), 0);
        assert_eq!(
            summary_entries(&log),
            vec!["[cancelled] Reset Windows Update components"]
        );
    }
}

#[test]
fn affirmed_confirmation_runs_the_body() {
    for answer in ["y", "Y", "  y  "] {
        let provider = StubProvider::default();
        let script = format!("5\n{answer}\n\nq\n");
        let (console, log) = run_console(&provider, &script);

        assert_eq!(provider.calls(), vec!["reset_update_components"]);
        assert!(console.contains("SUCCESS: Reset Windows Update components"));
        assert_eq!(
            count_lines_with(&log, "[INFO] Reset Windows Update components completed"),
            1
        );
        assert_eq!(
            summary_entries(&log),
            vec!["[ok] Reset Windows Update components"]
        );
    }
}

#[test]
fn failed_operation_is_recorded_and_loop_survives() {
    let provider = FailingProvider;
    let (console, log) = run_console(&provider, "1\n\nq\n");

    assert!(console.contains("FAILURE: Show system summary"));
    assert!(console.contains("refused the request"));
    assert_eq!(
        count_lines_with(&log, "[ERROR] Show system summary failed:"),
        1
    );
    assert_eq!(
        summary_entries(&log),
        vec!["[failed] Show system summary: external capability refused the request"]
    );
    // the loop kept going: menu rendered again, then the quit summary
    assert_eq!(count_lines_with(&console, "Select an option"), 2);
    assert!(console.contains("---- Session summary ----"));
}

#[test]
fn invalid_selection_invokes_nothing() {
    let provider = StubProvider::default();
    let (console, log) = run_console(&provider, "99\nq\n");

    assert!(provider.calls().is_empty());
    assert!(console.contains("`99` is not one of the listed options."));
    assert_eq!(count_lines_with(&console, "Select an option"), 2);
    assert!(console.contains("No actions were performed this session."));
    assert!(summary_entries(&log).is_empty());
    assert_eq!(count_lines_with(&log, "[ERROR]"), 0);
    assert_eq!(count_lines_with(&log, "[WARN]"), 0);
}

#[test]
fn quit_summary_lists_actions_in_original_order() {
    let provider = StubProvider::default();
    let (console, log) = run_console(&provider, "1\n\n11\n\n14\n\nq\n");

    let expected = [
        "[ok] Show system summary",
        "[ok] Report disk usage",
        "[ok] Check critical services",
    ];
    assert_eq!(summary_entries(&log), expected);

    // console shows the same three entries, in order, inside the summary
    let summary_at = console.find("---- Session summary ----").unwrap();
    let mut last = summary_at;
    for entry in expected {
        let at = console[last..].find(entry).map(|off| last + off).unwrap();
        assert!(at > summary_at, "{entry} should appear inside the summary");
        last = at;
    }

    // exit message and log location close the run, after the summary
    let exiting_at = log.find("Exiting maintenance console").unwrap();
    assert!(exiting_at > log.find("---- Session summary ----").unwrap());
    assert!(console.contains("Session log:"));
}

#[test]
fn ledger_matches_invocations_one_to_one() {
    let provider = StubProvider::default();
    // one success, one cancellation: exactly two ledger entries, no more
    let (_console, log) = run_console(&provider, "1\n\n5\nn\n\nq\n");
    assert_eq!(summary_entries(&log).len(), 2);
    assert_eq!(
        summary_entries(&log),
        vec![
            "[ok] Show system summary",
            "[cancelled] Reset Windows Update components"
        ]
    );
}

#[test]
fn closed_input_behaves_like_quit() {
    let provider = StubProvider::default();
    let (console, log) = run_console(&provider, "");

    assert!(console.contains("No actions were performed this session."));
    assert_eq!(count_lines_with(&log, "[INFO] Exiting maintenance console"), 1);
}

#[test]
fn help_viewer_touches_neither_ledger_nor_audit() {
    let provider = StubProvider::default();
    let (console, log) = run_console(&provider, "h\n\nq\n");

    assert!(provider.calls().is_empty());
    assert!(console.contains("Available operations"));
    assert!(console.contains("Stops the update services"));
    assert!(console.contains("Asks for confirmation before running."));
    assert!(console.contains("No actions were performed this session."));
    assert!(summary_entries(&log).is_empty());
    assert_eq!(count_lines_with(&log, "[WARN]"), 0);
    assert_eq!(count_lines_with(&log, "[ERROR]"), 0);
}

#[test]
fn every_task_dispatches_through_its_capability() {
    let provider = StubProvider::default();
    let script = "2\ny\n\n3\ny\n\n4\ny\n\n6\ny\n\n7\ny\n\n8\ny\n\n9\ny\n\n10\ny\n\n12\ny\n\n13\n\nq\n";
    let (_console, log) = run_console(&provider, script);

    assert_eq!(
        provider.calls(),
        vec![
            "create_restore_point",
            "verify_system_files",
            "scan_disk",
            "reset_network_stack",
            "rebuild_icon_cache",
            "reregister_store_apps",
            "repair_store_cache",
            "repair_system_image",
            "clean_temp_files",
            "export_update_log",
        ]
    );
    assert_eq!(summary_entries(&log).len(), 10);
    assert!(summary_entries(&log).iter().all(|e| e.starts_with("[ok]")));
}
