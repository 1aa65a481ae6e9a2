//! Execution wrapper for the built-in maintenance tools.
//!
//! The goal is to keep shell integration isolated so provider logic stays
//! uniform: candidate resolution, launch, and failure classification happen
//! here and nowhere else. External commands run without a watchdog; a slow
//! tool simply blocks the session, by contract.

use log::debug;
use std::env;
use std::path::PathBuf;
use std::process::Command;
use winmedic_core::{MedicError, MedicResult};

/// Captured result of one external tool run.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) status: i32,
}

impl CommandOutput {
    pub(crate) fn success(&self) -> bool {
        self.status == 0
    }

    /// Prefer stderr when the tool wrote anything there.
    pub(crate) fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        if !stderr.is_empty() {
            stderr.to_string()
        } else {
            stdout.to_string()
        }
    }
}

/// `%SystemRoot%\System32`, falling back to the stock install location.
pub(crate) fn system32_dir() -> PathBuf {
    env::var_os("SystemRoot")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("C:\\Windows"))
        .join("System32")
}

/// Candidate paths for a System32 tool: the pinned copy first, then a bare
/// name for PATH lookup.
pub(crate) fn tool_candidates(tool: &str) -> Vec<PathBuf> {
    vec![
        system32_dir().join(format!("{tool}.exe")),
        PathBuf::from(tool),
    ]
}

/// Candidate paths for Windows PowerShell.
pub(crate) fn powershell_candidates() -> Vec<PathBuf> {
    vec![
        system32_dir()
            .join("WindowsPowerShell")
            .join("v1.0")
            .join("powershell.exe"),
        PathBuf::from("powershell"),
    ]
}

/// Try each candidate until one launches. Absolute candidates must exist on
/// disk; bare names defer to PATH resolution.
pub(crate) fn run_candidates(candidates: &[PathBuf], args: &[&str]) -> MedicResult<CommandOutput> {
    for candidate in candidates {
        if candidate.is_absolute() && !candidate.exists() {
            continue;
        }
        debug!("running {} {:?}", candidate.display(), args);
        match Command::new(candidate).args(args).output() {
            Ok(raw) => {
                return Ok(CommandOutput {
                    stdout: String::from_utf8_lossy(&raw.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&raw.stderr).into_owned(),
                    status: raw.status.code().unwrap_or(-1),
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(MedicError::Provider(format!(
                    "failed to launch {}: {err}",
                    candidate.display()
                )));
            }
        }
    }

    Err(MedicError::Provider(format!(
        "none of {candidates:?} are available on this system"
    )))
}

/// Run a System32 tool and require a zero exit status.
pub(crate) fn run_checked(tool: &str, args: &[&str], action: &str) -> MedicResult<CommandOutput> {
    let output = run_candidates(&tool_candidates(tool), args)?;
    if output.success() {
        Ok(output)
    } else {
        Err(MedicError::Provider(classify_failure(tool, action, &output)))
    }
}

/// Run a PowerShell one-liner and require a zero exit status.
pub(crate) fn run_powershell(script: &str, action: &str) -> MedicResult<CommandOutput> {
    let args = ["-NoProfile", "-NonInteractive", "-Command", script];
    let output = run_candidates(&powershell_candidates(), &args)?;
    if output.success() {
        Ok(output)
    } else {
        Err(MedicError::Provider(classify_failure(
            "powershell",
            action,
            &output,
        )))
    }
}

/// Turn a nonzero exit into a message the operator can act on.
fn classify_failure(tool: &str, action: &str, output: &CommandOutput) -> String {
    let diagnostic = output.diagnostic();
    let lower = diagnostic.to_ascii_lowercase();
    let diagnostic = if diagnostic.is_empty() {
        "no additional output".to_string()
    } else {
        diagnostic
    };

    if lower.contains("access is denied")
        || lower.contains("permission denied")
        || lower.contains("requires elevation")
    {
        return format!(
            "{tool} could not {action}: {diagnostic}. Rerun winmedic from an elevated console"
        );
    }

    if lower.contains("not recognized") || lower.contains("cannot find") {
        return format!(
            "{tool} could not {action}: {diagnostic}. The tool appears to be missing from this installation"
        );
    }

    format!(
        "{tool} failed to {action} (exit code {}): {diagnostic}",
        output.status
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_pin_system32_before_path_lookup() {
        let candidates = tool_candidates("sfc");
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].is_absolute());
        assert!(candidates[0].ends_with("sfc.exe"));
        assert_eq!(candidates[1], PathBuf::from("sfc"));
    }

    #[test]
    fn missing_candidates_produce_an_availability_error() {
        let candidates = vec![PathBuf::from("/definitely/not/here/tool.exe")];
        let err = run_candidates(&candidates, &[]).unwrap_err();
        assert!(err.to_string().contains("available on this system"));
    }

    #[test]
    fn diagnostic_prefers_stderr() {
        let output = CommandOutput {
            stdout: "progress text".into(),
            stderr: "the real reason".into(),
            status: 1,
        };
        assert_eq!(output.diagnostic(), "the real reason");

        let quiet = CommandOutput {
            stdout: "only stdout".into(),
            stderr: "  ".into(),
            status: 1,
        };
        assert_eq!(quiet.diagnostic(), "only stdout");
    }

    #[test]
    fn denied_access_is_classified_as_an_elevation_problem() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: "Access is denied.".into(),
            status: 5,
        };
        let message = classify_failure("sc", "query the service", &output);
        assert!(message.contains("elevated console"));
    }

    #[test]
    fn silent_failures_report_the_exit_code() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            status: 7,
        };
        let message = classify_failure("chkdsk", "scan the drive", &output);
        assert!(message.contains("exit code 7"));
        assert!(message.contains("no additional output"));
    }
}
