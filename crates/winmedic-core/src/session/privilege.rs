//! Elevation verification performed once, before the first menu render.

use crate::error::{MedicError, MedicResult};
use std::env;

const ASSUME_ELEVATED_ENV: &str = "WINMEDIC_ASSUME_ELEVATED";

/// Verify the process holds the elevation the maintenance operations need.
/// `WINMEDIC_ASSUME_ELEVATED` skips the probe for tests and dry runs.
pub fn ensure_elevated() -> MedicResult<()> {
    if env::var_os(ASSUME_ELEVATED_ENV).is_some() || running_elevated() {
        Ok(())
    } else {
        Err(missing_privilege_error())
    }
}

#[cfg(windows)]
fn running_elevated() -> bool {
    use std::path::PathBuf;
    use std::process::Command;

    // `net session` only succeeds from an elevated console.
    let system32 = env::var_os("SystemRoot")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("C:\\Windows"))
        .join("System32");
    for candidate in [system32.join("net.exe"), PathBuf::from("net.exe")] {
        if let Ok(output) = Command::new(&candidate).arg("session").output() {
            return output.status.success();
        }
    }
    false
}

#[cfg(unix)]
fn running_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(any(unix, windows)))]
fn running_elevated() -> bool {
    false
}

fn missing_privilege_error() -> MedicError {
    MedicError::Privilege(
        "winmedic needs an elevated console: the maintenance operations restart services, \
         rewrite caches, and scan protected files. Reopen the terminal with `Run as \
         administrator` (or as root) and start winmedic again."
            .into(),
    )
}
