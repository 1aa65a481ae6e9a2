//! Concrete provider that drives the built-in Windows maintenance tools.

use crate::command::{run_candidates, run_checked, run_powershell, tool_candidates};
use log::warn;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use winmedic_core::{CleanupStats, MaintenanceProvider, MedicError, ServiceState, ServiceStatus};

/// Provider backed by `systeminfo`, `sfc`, `chkdsk`, `net`, `netsh`, `sc`,
/// `DISM`, `wsreset`, `ie4uinit`, `fsutil`, and PowerShell.
///
/// Each capability maps to exactly one tool invocation (or one fixed
/// sequence for the reset flows); nothing here writes to the audit trail or
/// ledger, which stay the engine's job.
#[derive(Debug, Clone)]
pub struct SystemMaintenanceProvider {
    temp_root: PathBuf,
}

impl Default for SystemMaintenanceProvider {
    fn default() -> SystemMaintenanceProvider {
        SystemMaintenanceProvider {
            temp_root: env::temp_dir(),
        }
    }
}

impl SystemMaintenanceProvider {
    pub fn new() -> SystemMaintenanceProvider {
        SystemMaintenanceProvider::default()
    }

    /// Override the primary temp directory the cleanup pass empties.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> SystemMaintenanceProvider {
        self.temp_root = root.into();
        self
    }

    fn stop_service(&self, name: &str, steps: &mut Vec<String>) -> Result<(), MedicError> {
        let output = run_candidates(&tool_candidates("net"), &["stop", name])?;
        if output.success() {
            steps.push(format!("Stopped {name}"));
        } else if output.diagnostic().to_ascii_lowercase().contains("not started") {
            steps.push(format!("{name} was already stopped"));
        } else {
            return Err(MedicError::Provider(format!(
                "net could not stop {name}: {}",
                output.diagnostic()
            )));
        }
        Ok(())
    }

    fn start_service(&self, name: &str, steps: &mut Vec<String>) -> Result<(), MedicError> {
        let output = run_candidates(&tool_candidates("net"), &["start", name])?;
        if output.success() {
            steps.push(format!("Started {name}"));
        } else if output
            .diagnostic()
            .to_ascii_lowercase()
            .contains("already been started")
        {
            steps.push(format!("{name} was already running"));
        } else {
            return Err(MedicError::Provider(format!(
                "net could not start {name}: {}",
                output.diagnostic()
            )));
        }
        Ok(())
    }
}

/// Rename `dir` to `dir.old` so the owning service rebuilds it from scratch.
/// A leftover `.old` from an earlier run is deleted first.
fn sideline_cache(dir: &Path, steps: &mut Vec<String>) -> Result<(), MedicError> {
    if !dir.exists() {
        steps.push(format!("{} not present; nothing to sideline", dir.display()));
        return Ok(());
    }

    let mut sidelined = dir.as_os_str().to_os_string();
    sidelined.push(".old");
    let sidelined = PathBuf::from(sidelined);
    if sidelined.exists() {
        fs::remove_dir_all(&sidelined).map_err(|err| {
            MedicError::Provider(format!(
                "cannot clear previous sideline {}: {err}",
                sidelined.display()
            ))
        })?;
    }
    fs::rename(dir, &sidelined).map_err(|err| {
        MedicError::Provider(format!("cannot sideline {}: {err}", dir.display()))
    })?;
    steps.push(format!(
        "Sidelined {} to {}",
        dir.display(),
        sidelined.display()
    ));
    Ok(())
}

/// Escape a value for interpolation inside single quotes in PowerShell.
fn powershell_quote(value: &str) -> String {
    value.replace('\'', "''")
}

impl MaintenanceProvider for SystemMaintenanceProvider {
    type Error = MedicError;

    fn system_summary(&self) -> Result<String, Self::Error> {
        let output = run_checked("systeminfo", &[], "collect the system summary")?;
        Ok(output.stdout.trim().to_string())
    }

    fn create_restore_point(&self, description: &str) -> Result<String, Self::Error> {
        let script = format!(
            "Checkpoint-Computer -Description '{}' -RestorePointType MODIFY_SETTINGS",
            powershell_quote(description)
        );
        run_powershell(&script, "create the restore point")?;
        Ok(format!("Restore point `{description}` created"))
    }

    fn verify_system_files(&self) -> Result<String, Self::Error> {
        run_checked("sfc", &["/scannow"], "verify protected system files")?;
        Ok("System file check completed; details are in CBS.log".to_string())
    }

    fn scan_disk(&self, drive: &str) -> Result<String, Self::Error> {
        run_checked("chkdsk", &[drive, "/scan"], "scan the drive")?;
        Ok(format!("{drive} scanned online with no blocking errors"))
    }

    fn reset_update_components(
        &self,
        services: &[String],
        cache_dirs: &[PathBuf],
    ) -> Result<Vec<String>, Self::Error> {
        let mut steps = Vec::new();
        for service in services {
            self.stop_service(service, &mut steps)?;
        }
        for dir in cache_dirs {
            sideline_cache(dir, &mut steps)?;
        }
        for service in services.iter().rev() {
            self.start_service(service, &mut steps)?;
        }
        Ok(steps)
    }

    fn reset_network_stack(&self) -> Result<Vec<String>, Self::Error> {
        let mut steps = Vec::new();
        run_checked("netsh", &["winsock", "reset"], "reset the winsock catalog")?;
        steps.push("Winsock catalog reset".to_string());
        run_checked("netsh", &["int", "ip", "reset"], "reset the IP stack")?;
        steps.push("IP stack reset".to_string());
        run_checked("ipconfig", &["/flushdns"], "flush the DNS resolver cache")?;
        steps.push("DNS resolver cache flushed".to_string());
        steps.push("A reboot is required before the reset fully applies".to_string());
        Ok(steps)
    }

    fn rebuild_icon_cache(&self) -> Result<String, Self::Error> {
        run_checked("ie4uinit", &["-ClearIconCache"], "clear the icon cache")?;
        Ok("Icon cache cleared; the shell rebuilds it on next sign-in".to_string())
    }

    fn reregister_store_apps(&self) -> Result<String, Self::Error> {
        let script = "Get-AppXPackage -AllUsers | Foreach {Add-AppxPackage \
                      -DisableDevelopmentMode -Register \
                      \"$($_.InstallLocation)\\AppXManifest.xml\"}";
        run_powershell(script, "re-register the store applications")?;
        Ok("Store applications re-registered for all users".to_string())
    }

    fn repair_store_cache(&self) -> Result<String, Self::Error> {
        run_checked("wsreset", &[], "reset the store cache")?;
        Ok("Store download cache reset".to_string())
    }

    fn repair_system_image(&self) -> Result<String, Self::Error> {
        run_checked(
            "dism",
            &["/Online", "/Cleanup-Image", "/RestoreHealth"],
            "repair the component store",
        )?;
        Ok("Component store diagnostics and repair completed".to_string())
    }

    fn disk_usage(&self, drive: &str) -> Result<String, Self::Error> {
        let output = run_checked(
            "fsutil",
            &["volume", "diskfree", drive],
            "read the volume free-space counters",
        )?;
        Ok(output.stdout.trim().to_string())
    }

    fn clean_temp_files(&self, extra_dirs: &[PathBuf]) -> Result<CleanupStats, Self::Error> {
        let mut stats = CleanupStats::default();
        let mut targets = vec![self.temp_root.clone()];
        targets.extend(extra_dirs.iter().cloned());

        for dir in targets {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("cannot read temp directory {}: {err}", dir.display());
                    stats.skipped += 1;
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let file_size = entry
                    .metadata()
                    .ok()
                    .filter(|meta| meta.is_file())
                    .map(|meta| meta.len());
                let removed = if path.is_dir() {
                    fs::remove_dir_all(&path).is_ok()
                } else {
                    fs::remove_file(&path).is_ok()
                };
                if removed {
                    stats.removed += 1;
                    stats.freed_bytes += file_size.unwrap_or(0);
                } else {
                    // locked by a running process; the next run gets it
                    stats.skipped += 1;
                }
            }
        }

        Ok(stats)
    }

    fn export_update_log(&self, destination: &Path) -> Result<PathBuf, Self::Error> {
        let script = format!(
            "Get-WindowsUpdateLog -LogPath '{}'",
            powershell_quote(&destination.to_string_lossy())
        );
        run_powershell(&script, "render the update log")?;
        Ok(destination.to_path_buf())
    }

    fn service_health(&self, services: &[String]) -> Result<Vec<ServiceStatus>, Self::Error> {
        let mut statuses = Vec::with_capacity(services.len());
        for name in services {
            let output = run_candidates(&tool_candidates("sc"), &["query", name.as_str()])?;
            let state = if output.stdout.contains("RUNNING") {
                ServiceState::Running
            } else if output.stdout.contains("STOPPED") {
                ServiceState::Stopped
            } else {
                ServiceState::Unknown(output.diagnostic())
            };
            statuses.push(ServiceStatus {
                name: name.clone(),
                state,
            });
        }
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_cleanup_empties_the_root_but_keeps_it() {
        let root = tempdir().unwrap();
        let extra = tempdir().unwrap();
        fs::write(root.path().join("a.tmp"), b"aaaa").unwrap();
        fs::write(root.path().join("b.tmp"), b"bbbbbbbb").unwrap();
        fs::create_dir(root.path().join("scratch")).unwrap();
        fs::write(root.path().join("scratch").join("c.tmp"), b"cc").unwrap();
        fs::write(extra.path().join("d.tmp"), b"dd").unwrap();

        let provider = SystemMaintenanceProvider::new().with_temp_root(root.path());
        let stats = provider
            .clean_temp_files(&[extra.path().to_path_buf()])
            .unwrap();

        assert_eq!(stats.removed, 4); // a, b, scratch/, d
        assert_eq!(stats.freed_bytes, 4 + 8 + 2);
        assert_eq!(stats.skipped, 0);
        assert!(root.path().exists());
        assert!(extra.path().exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_extra_dir_counts_as_skipped() {
        let root = tempdir().unwrap();
        let provider = SystemMaintenanceProvider::new().with_temp_root(root.path());
        let stats = provider
            .clean_temp_files(&[PathBuf::from("/no/such/dir")])
            .unwrap();
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn sideline_renames_and_replaces_previous_sideline() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("SoftwareDistribution");
        fs::create_dir(&cache).unwrap();
        fs::write(cache.join("download.dat"), b"payload").unwrap();

        let mut steps = Vec::new();
        sideline_cache(&cache, &mut steps).unwrap();
        assert!(!cache.exists());
        let old = dir.path().join("SoftwareDistribution.old");
        assert!(old.join("download.dat").exists());
        assert!(steps[0].contains("Sidelined"));

        // a second pass with a fresh cache replaces the stale .old copy
        fs::create_dir(&cache).unwrap();
        let mut steps = Vec::new();
        sideline_cache(&cache, &mut steps).unwrap();
        assert!(old.exists());
        assert!(!old.join("download.dat").exists());
    }

    #[test]
    fn sideline_of_absent_cache_is_a_noop() {
        let dir = tempdir().unwrap();
        let mut steps = Vec::new();
        sideline_cache(&dir.path().join("catroot2"), &mut steps).unwrap();
        assert_eq!(steps.len(), 1);
        assert!(steps[0].contains("not present"));
    }

    #[cfg(not(windows))]
    #[test]
    fn capabilities_report_missing_tools_off_windows() {
        let provider = SystemMaintenanceProvider::new();
        let err = provider.verify_system_files().unwrap_err();
        assert!(err.to_string().contains("available on this system"));
    }

    #[test]
    fn powershell_quoting_doubles_single_quotes() {
        assert_eq!(powershell_quote("it's"), "it''s");
        assert_eq!(powershell_quote("plain"), "plain");
    }
}
