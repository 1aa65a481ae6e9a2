//! Configuration model and helpers for the maintenance console.

use crate::error::{MedicError, MedicResult};
use directories_next::ProjectDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "winmedic.toml";
const CONFIG_ENV: &str = "WINMEDIC_CONFIG";
const APP_QUALIFIER: &str = "io";
const APP_ORGANIZATION: &str = "Winmedic";
const APP_NAME: &str = "winmedic";

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
}

/// Which drive the disk operations target and which services the health
/// check watches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    /// Drive letter the scan/usage operations run against, e.g. `C:`.
    #[serde(default = "default_drive")]
    pub drive: String,
    /// Services the critical-service check queries.
    #[serde(default = "default_critical_services")]
    pub critical_services: Vec<String>,
}

impl Default for Policy {
    fn default() -> Policy {
        Policy {
            drive: default_drive(),
            critical_services: default_critical_services(),
        }
    }
}

/// Update-stack reset behavior: the services to cycle and the caches to
/// sideline while they are stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateCfg {
    #[serde(default = "default_update_services")]
    pub services: Vec<String>,
    #[serde(default = "default_update_cache_dirs")]
    pub cache_dirs: Vec<PathBuf>,
}

impl Default for UpdateCfg {
    fn default() -> UpdateCfg {
        UpdateCfg {
            services: default_update_services(),
            cache_dirs: default_update_cache_dirs(),
        }
    }
}

/// Temp-file cleanup targets beyond the process temp directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CleanupCfg {
    #[serde(default)]
    pub extra_temp_dirs: Vec<PathBuf>,
}

/// Restore-point naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestoreCfg {
    #[serde(default = "default_restore_description")]
    pub description: String,
}

impl Default for RestoreCfg {
    fn default() -> RestoreCfg {
        RestoreCfg {
            description: default_restore_description(),
        }
    }
}

/// Root configuration object loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MedicConfig {
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub update: UpdateCfg,
    #[serde(default)]
    pub cleanup: CleanupCfg,
    #[serde(default)]
    pub restore: RestoreCfg,

    /// Where this configuration was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl MedicConfig {
    /// Parse the file at `path`.
    pub fn load(path: &Path) -> MedicResult<MedicConfig> {
        let payload = fs::read_to_string(path)?;
        let mut config: MedicConfig = toml::from_str(&payload)
            .map_err(|err| MedicError::InvalidConfig(format!("{}: {err}", path.display())))?;
        config.path = path.to_path_buf();
        Ok(config)
    }

    /// Load `path` when it exists; otherwise fall back to `WINMEDIC_CONFIG`
    /// or the per-user config location, writing a commented bootstrap
    /// template there on first run.
    pub fn load_or_bootstrap(path: &Path) -> MedicResult<MedicConfig> {
        if path.exists() {
            return MedicConfig::load(path);
        }

        if let Some(env_path) = env::var_os(CONFIG_ENV).map(PathBuf::from) {
            if env_path.exists() {
                return MedicConfig::load(&env_path);
            }
        }

        let bootstrap = default_config_path();
        if bootstrap.exists() {
            return MedicConfig::load(&bootstrap);
        }

        if let Some(parent) = bootstrap.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&bootstrap, bootstrap_template())?;
        info!("wrote bootstrap configuration to {}", bootstrap.display());
        MedicConfig::load(&bootstrap)
    }

    /// Persist the current values back to `self.path`.
    pub fn save(&self) -> MedicResult<()> {
        let payload = toml::to_string_pretty(self)
            .map_err(|err| MedicError::InvalidConfig(err.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, payload)?;
        Ok(())
    }

    /// Non-fatal sanity pass; each returned string is one issue to fix.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !looks_like_drive(&self.policy.drive) {
            issues.push(format!(
                "policy.drive `{}` should be a drive letter followed by a colon (e.g. C:)",
                self.policy.drive
            ));
        }
        if self.policy.critical_services.is_empty() {
            issues.push("policy.critical_services is empty; the service check would be a no-op".into());
        }
        if self.update.services.is_empty() {
            issues.push("update.services is empty; the update reset would cycle nothing".into());
        }
        for dir in &self.update.cache_dirs {
            if dir.as_os_str().is_empty() {
                issues.push("update.cache_dirs contains an empty path".into());
            }
        }
        for dir in &self.cleanup.extra_temp_dirs {
            if !dir.is_absolute() {
                issues.push(format!(
                    "cleanup.extra_temp_dirs entry `{}` must be absolute",
                    dir.display()
                ));
            }
        }
        if self.restore.description.trim().is_empty() {
            issues.push("restore.description must not be blank".into());
        }

        issues
    }
}

/// Lightweight check that a configured drive value matches `X:` form.
pub fn looks_like_drive(value: &str) -> bool {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some(':'), None) if letter.is_ascii_alphabetic()
    )
}

/// Default per-user configuration path, with a relative fallback when the
/// platform offers no home directory.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Commented template written on first run.
pub fn bootstrap_template() -> String {
    "# Auto-generated winmedic configuration bootstrap.\n\
     # Adjust these values before running maintenance on managed fleets.\n\
     \n\
     [policy]\n\
     # Drive the disk scan and usage report target.\n\
     drive = \"C:\"\n\
     # Services the critical-service check queries.\n\
     critical_services = [\"wuauserv\", \"bits\", \"cryptsvc\", \"Dnscache\", \"LanmanWorkstation\"]\n\
     \n\
     [update]\n\
     # Services cycled during the update-component reset, in stop order.\n\
     services = [\"wuauserv\", \"cryptsvc\", \"bits\", \"msiserver\"]\n\
     # Caches sidelined (renamed to *.old) while the services are stopped.\n\
     cache_dirs = [\"C:\\\\Windows\\\\SoftwareDistribution\", \"C:\\\\Windows\\\\System32\\\\catroot2\"]\n\
     \n\
     [cleanup]\n\
     # Directories emptied in addition to the process temp directory.\n\
     extra_temp_dirs = []\n\
     \n\
     [restore]\n\
     description = \"winmedic checkpoint\"\n"
        .to_string()
}

fn default_drive() -> String {
    "C:".to_string()
}

fn default_critical_services() -> Vec<String> {
    ["wuauserv", "bits", "cryptsvc", "Dnscache", "LanmanWorkstation"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_update_services() -> Vec<String> {
    ["wuauserv", "cryptsvc", "bits", "msiserver"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_update_cache_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("C:\\Windows\\SoftwareDistribution"),
        PathBuf::from("C:\\Windows\\System32\\catroot2"),
    ]
}

fn default_restore_description() -> String {
    "winmedic checkpoint".to_string()
}
