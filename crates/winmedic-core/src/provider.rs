//! Provider contract used by the session engine.
//!
//! Concrete implementations live in provider crates such as
//! `winmedic-system`, which shells out to the real OS tools. The engine only
//! sees aggregate success/failure plus human-readable detail lines, so tests
//! can swap in stub providers without touching the dispatch logic.

use std::error::Error;
use std::path::{Path, PathBuf};

/// Reported state of one watched service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
    Unknown(String),
}

/// Health snapshot for a single critical service.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub name: String,
    pub state: ServiceState,
}

impl ServiceStatus {
    pub fn describe(&self) -> String {
        match &self.state {
            ServiceState::Running => format!("{} is running", self.name),
            ServiceState::Stopped => format!("{} is STOPPED", self.name),
            ServiceState::Unknown(reason) => format!("{}: state unknown ({reason})", self.name),
        }
    }
}

/// Aggregate result of a temp-file cleanup pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupStats {
    pub removed: usize,
    pub freed_bytes: u64,
    pub skipped: usize,
}

impl CleanupStats {
    pub fn describe(&self) -> String {
        format!(
            "removed {} entries ({} KB freed, {} in use and skipped)",
            self.removed,
            self.freed_bytes / 1024,
            self.skipped
        )
    }
}

/// One method per maintenance capability the catalog can invoke.
///
/// Implementations report only aggregate success/failure and short summary
/// text; the engine never re-parses tool output. Every method maps to
/// exactly one external capability, which is why the trait is wide rather
/// than deep.
pub trait MaintenanceProvider {
    type Error: Error + Send + Sync + 'static;

    /// Hardware/OS summary for the operator (model, build, memory, uptime).
    fn system_summary(&self) -> Result<String, Self::Error>;

    /// Create a system restore point with the given description.
    fn create_restore_point(&self, description: &str) -> Result<String, Self::Error>;

    /// Run the system file checker over protected files.
    fn verify_system_files(&self) -> Result<String, Self::Error>;

    /// Run an online integrity scan of the given drive.
    fn scan_disk(&self, drive: &str) -> Result<String, Self::Error>;

    /// Stop the named update services, sideline the cache directories, and
    /// restart the services in reverse order.
    fn reset_update_components(
        &self,
        services: &[String],
        cache_dirs: &[PathBuf],
    ) -> Result<Vec<String>, Self::Error>;

    /// Reset the network stack (winsock, IP configuration, DNS cache).
    fn reset_network_stack(&self) -> Result<Vec<String>, Self::Error>;

    /// Rebuild the shell icon cache.
    fn rebuild_icon_cache(&self) -> Result<String, Self::Error>;

    /// Re-register the built-in store applications for all users.
    fn reregister_store_apps(&self) -> Result<String, Self::Error>;

    /// Clear and rebuild the store download cache.
    fn repair_store_cache(&self) -> Result<String, Self::Error>;

    /// Run component-store diagnostics and repair against the online image.
    fn repair_system_image(&self) -> Result<String, Self::Error>;

    /// Free/total space report for the given drive.
    fn disk_usage(&self, drive: &str) -> Result<String, Self::Error>;

    /// Delete expendable files from the temp directories.
    fn clean_temp_files(&self, extra_dirs: &[PathBuf]) -> Result<CleanupStats, Self::Error>;

    /// Render the update event trace into a readable log at `destination`.
    fn export_update_log(&self, destination: &Path) -> Result<PathBuf, Self::Error>;

    /// Query the state of each named service.
    fn service_health(&self, services: &[String]) -> Result<Vec<ServiceStatus>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_status_descriptions_name_the_service() {
        let running = ServiceStatus {
            name: "wuauserv".into(),
            state: ServiceState::Running,
        };
        let stopped = ServiceStatus {
            name: "bits".into(),
            state: ServiceState::Stopped,
        };
        let unknown = ServiceStatus {
            name: "cryptsvc".into(),
            state: ServiceState::Unknown("query refused".into()),
        };

        assert_eq!(running.describe(), "wuauserv is running");
        assert!(stopped.describe().contains("STOPPED"));
        assert!(unknown.describe().contains("query refused"));
    }

    #[test]
    fn cleanup_stats_describe_reports_kilobytes() {
        let stats = CleanupStats {
            removed: 12,
            freed_bytes: 4096,
            skipped: 3,
        };
        let text = stats.describe();
        assert!(text.contains("12 entries"));
        assert!(text.contains("4 KB"));
        assert!(text.contains("3 in use"));
    }
}
