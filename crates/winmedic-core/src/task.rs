//! The fixed table of maintenance tasks the console can run.
//!
//! Each variant is data: a selector, a label, whether it needs confirmation,
//! and which provider capability it invokes. The dispatch/bookkeeping rules
//! live in [`crate::session`], not here.

use crate::config::MedicConfig;
use crate::provider::MaintenanceProvider;
use std::env;

/// Tri-state result of invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
    Cancelled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Every maintenance operation the catalog offers, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceTask {
    SystemSummary,
    RestorePoint,
    FileChecker,
    DiskScan,
    UpdateReset,
    NetworkReset,
    IconCacheRebuild,
    StoreAppReregister,
    StoreCacheRepair,
    ImageRepair,
    DiskUsage,
    TempCleanup,
    UpdateLogExport,
    ServiceCheck,
}

impl MaintenanceTask {
    pub const ALL: [MaintenanceTask; 14] = [
        MaintenanceTask::SystemSummary,
        MaintenanceTask::RestorePoint,
        MaintenanceTask::FileChecker,
        MaintenanceTask::DiskScan,
        MaintenanceTask::UpdateReset,
        MaintenanceTask::NetworkReset,
        MaintenanceTask::IconCacheRebuild,
        MaintenanceTask::StoreAppReregister,
        MaintenanceTask::StoreCacheRepair,
        MaintenanceTask::ImageRepair,
        MaintenanceTask::DiskUsage,
        MaintenanceTask::TempCleanup,
        MaintenanceTask::UpdateLogExport,
        MaintenanceTask::ServiceCheck,
    ];

    /// Menu selector. Numeric selectors keep the catalog's canonical order.
    pub fn selector(self) -> &'static str {
        match self {
            MaintenanceTask::SystemSummary => "1",
            MaintenanceTask::RestorePoint => "2",
            MaintenanceTask::FileChecker => "3",
            MaintenanceTask::DiskScan => "4",
            MaintenanceTask::UpdateReset => "5",
            MaintenanceTask::NetworkReset => "6",
            MaintenanceTask::IconCacheRebuild => "7",
            MaintenanceTask::StoreAppReregister => "8",
            MaintenanceTask::StoreCacheRepair => "9",
            MaintenanceTask::ImageRepair => "10",
            MaintenanceTask::DiskUsage => "11",
            MaintenanceTask::TempCleanup => "12",
            MaintenanceTask::UpdateLogExport => "13",
            MaintenanceTask::ServiceCheck => "14",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaintenanceTask::SystemSummary => "Show system summary",
            MaintenanceTask::RestorePoint => "Create a system restore point",
            MaintenanceTask::FileChecker => "Verify protected system files",
            MaintenanceTask::DiskScan => "Scan the system drive for errors",
            MaintenanceTask::UpdateReset => "Reset Windows Update components",
            MaintenanceTask::NetworkReset => "Reset the network stack",
            MaintenanceTask::IconCacheRebuild => "Rebuild the icon cache",
            MaintenanceTask::StoreAppReregister => "Re-register store applications",
            MaintenanceTask::StoreCacheRepair => "Repair the store download cache",
            MaintenanceTask::ImageRepair => "Repair the system image",
            MaintenanceTask::DiskUsage => "Report disk usage",
            MaintenanceTask::TempCleanup => "Clean temporary files",
            MaintenanceTask::UpdateLogExport => "Generate the update log",
            MaintenanceTask::ServiceCheck => "Check critical services",
        }
    }

    /// One-line explanation shown by the help viewer.
    pub fn description(self) -> &'static str {
        match self {
            MaintenanceTask::SystemSummary => {
                "Collects the OS build, hardware model, and memory figures for the record."
            }
            MaintenanceTask::RestorePoint => {
                "Checkpoints the system state so later repairs can be rolled back."
            }
            MaintenanceTask::FileChecker => {
                "Runs the system file checker and repairs protected files it finds damaged."
            }
            MaintenanceTask::DiskScan => {
                "Runs an online integrity scan of the configured drive without scheduling a reboot."
            }
            MaintenanceTask::UpdateReset => {
                "Stops the update services, sidelines their caches, and starts them again."
            }
            MaintenanceTask::NetworkReset => {
                "Resets winsock and the IP stack and flushes the DNS resolver cache."
            }
            MaintenanceTask::IconCacheRebuild => {
                "Clears the shell icon cache so the desktop redraws stale icons."
            }
            MaintenanceTask::StoreAppReregister => {
                "Re-registers the built-in store applications for every user profile."
            }
            MaintenanceTask::StoreCacheRepair => {
                "Resets the store download cache when store installs hang or fail."
            }
            MaintenanceTask::ImageRepair => {
                "Runs component-store diagnostics and repair against the running image."
            }
            MaintenanceTask::DiskUsage => {
                "Reports free and total space on the configured drive."
            }
            MaintenanceTask::TempCleanup => {
                "Deletes expendable files from the temp directories; locked files are skipped."
            }
            MaintenanceTask::UpdateLogExport => {
                "Renders the update event trace into a readable log file."
            }
            MaintenanceTask::ServiceCheck => {
                "Queries each configured critical service and reports any that are down."
            }
        }
    }

    /// Whether the operation changes system state and therefore passes the
    /// confirmation gate before running.
    pub fn requires_confirmation(self) -> bool {
        !matches!(
            self,
            MaintenanceTask::SystemSummary
                | MaintenanceTask::DiskUsage
                | MaintenanceTask::UpdateLogExport
                | MaintenanceTask::ServiceCheck
        )
    }

    /// Invoke the single provider capability backing this task and return
    /// the detail lines to show inside the operation's output block.
    pub fn run<P: MaintenanceProvider>(
        self,
        provider: &P,
        config: &MedicConfig,
    ) -> Result<Vec<String>, P::Error> {
        match self {
            MaintenanceTask::SystemSummary => provider
                .system_summary()
                .map(|text| text.lines().map(str::to_string).collect()),
            MaintenanceTask::RestorePoint => provider
                .create_restore_point(&config.restore.description)
                .map(|line| vec![line]),
            MaintenanceTask::FileChecker => provider.verify_system_files().map(|line| vec![line]),
            MaintenanceTask::DiskScan => {
                provider.scan_disk(&config.policy.drive).map(|line| vec![line])
            }
            MaintenanceTask::UpdateReset => provider
                .reset_update_components(&config.update.services, &config.update.cache_dirs),
            MaintenanceTask::NetworkReset => provider.reset_network_stack(),
            MaintenanceTask::IconCacheRebuild => {
                provider.rebuild_icon_cache().map(|line| vec![line])
            }
            MaintenanceTask::StoreAppReregister => {
                provider.reregister_store_apps().map(|line| vec![line])
            }
            MaintenanceTask::StoreCacheRepair => {
                provider.repair_store_cache().map(|line| vec![line])
            }
            MaintenanceTask::ImageRepair => provider.repair_system_image().map(|line| vec![line]),
            MaintenanceTask::DiskUsage => {
                provider.disk_usage(&config.policy.drive).map(|line| vec![line])
            }
            MaintenanceTask::TempCleanup => provider
                .clean_temp_files(&config.cleanup.extra_temp_dirs)
                .map(|stats| vec![stats.describe()]),
            MaintenanceTask::UpdateLogExport => {
                let destination = env::temp_dir().join("WindowsUpdate.log");
                provider
                    .export_update_log(&destination)
                    .map(|path| vec![format!("Update log written to {}", path.display())])
            }
            MaintenanceTask::ServiceCheck => provider
                .service_health(&config.policy.critical_services)
                .map(|statuses| statuses.iter().map(|status| status.describe()).collect()),
        }
    }
}
