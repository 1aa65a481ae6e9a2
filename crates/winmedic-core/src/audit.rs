//! Session audit trail: the append-only, timestamped record of everything the
//! console did during one run.
//!
//! This pipeline is deliberately separate from the `log` facade so the file a
//! technician hands back after a support session contains only operator
//! actions, one line per entry.

use chrono::Local;
use colored::Colorize;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_DIR_ENV: &str = "WINMEDIC_LOG_DIR";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Characters that never belong in an operator-supplied log path.
const ILLEGAL_PATH_CHARS: &[char] = &['<', '>', '"', '|', '?', '*'];

/// Severity attached to every audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

impl AuditLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Warn => "WARN",
            AuditLevel::Error => "ERROR",
        }
    }

    fn console_tag(self) -> String {
        match self {
            AuditLevel::Info => format!("[{}]", "INFO".cyan()),
            AuditLevel::Warn => format!("[{}]", "WARN".yellow()),
            AuditLevel::Error => format!("[{}]", "ERROR".red().bold()),
        }
    }
}

/// Append-only session log. Created once at startup and kept open for the
/// whole run; prior entries are never rewritten.
pub struct AuditLog {
    path: PathBuf,
    file: Option<File>,
    echo: bool,
}

impl AuditLog {
    /// Open the audit log, preferring `custom` when the operator supplied a
    /// path. An unusable custom path is reported once on the console and the
    /// log falls back to the default location; an unusable default leaves the
    /// log console-only. This constructor never fails the host process.
    pub fn open(custom: Option<&Path>) -> AuditLog {
        if let Some(path) = custom {
            match validate_custom_path(path) {
                Ok(()) => match open_append(path) {
                    Ok(file) => return AuditLog::new(path.to_path_buf(), Some(file)),
                    Err(err) => {
                        eprintln!(
                            "warning: cannot write session log to {} ({err}); using the default location",
                            path.display()
                        );
                    }
                },
                Err(reason) => {
                    eprintln!(
                        "warning: ignoring session log path {} ({reason}); using the default location",
                        path.display()
                    );
                }
            }
        }

        let path = default_log_path();
        match open_append(&path) {
            Ok(file) => AuditLog::new(path, Some(file)),
            Err(err) => {
                eprintln!(
                    "warning: cannot write session log to {} ({err}); continuing without a log file",
                    path.display()
                );
                AuditLog::new(path, None)
            }
        }
    }

    /// Open the audit log at an exact path, failing instead of falling back.
    /// Intended for tests and embedding, not the interactive startup path.
    pub fn at_path(path: &Path) -> std::io::Result<AuditLog> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = open_append(path)?;
        Ok(AuditLog::new(path.to_path_buf(), Some(file)))
    }

    fn new(path: PathBuf, file: Option<File>) -> AuditLog {
        AuditLog {
            path,
            file,
            echo: true,
        }
    }

    /// Disable the console echo. The file side is unaffected.
    pub fn with_echo(mut self, echo: bool) -> AuditLog {
        self.echo = echo;
        self
    }

    /// Location the log is (or would be) written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and echo it to the console with a severity tag.
    /// File-write failures are swallowed; the console echo always happens.
    pub fn record(&mut self, level: AuditLevel, message: &str) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        if let Some(file) = self.file.as_mut() {
            let _ = writeln!(file, "{timestamp} [{}] {message}", level.as_str());
            let _ = file.flush();
        }
        if self.echo {
            println!("{} {message}", level.console_tag());
        }
    }

    pub fn info(&mut self, message: &str) {
        self.record(AuditLevel::Info, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.record(AuditLevel::Warn, message);
    }

    pub fn error(&mut self, message: &str) {
        self.record(AuditLevel::Error, message);
    }

    /// Append the end-of-session summary block under a fixed heading. Entries
    /// are written verbatim, in order, without per-line severity tags.
    pub fn append_summary(&mut self, heading: &str, entries: &[String]) {
        if let Some(file) = self.file.as_mut() {
            let _ = writeln!(file, "---- {heading} ----");
            if entries.is_empty() {
                let _ = writeln!(file, "(no actions performed)");
            } else {
                for entry in entries {
                    let _ = writeln!(file, "{entry}");
                }
            }
            let _ = file.flush();
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Reject paths containing characters no supported filesystem accepts, then
/// make sure the parent directory exists.
fn validate_custom_path(path: &Path) -> Result<(), String> {
    let text = path.to_string_lossy();
    if let Some(bad) = text.chars().find(|ch| ILLEGAL_PATH_CHARS.contains(ch)) {
        return Err(format!("path contains illegal character `{bad}`"));
    }
    if text.chars().any(|ch| ch.is_control()) {
        return Err("path contains control characters".to_string());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("cannot create parent directory: {err}"))?;
        }
    }
    Ok(())
}

/// Default log location: `WINMEDIC_LOG_DIR` override or the process temp
/// directory, named with a run-specific timestamp so runs never collide.
fn default_log_path() -> PathBuf {
    let dir = env::var_os(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("winmedic-{stamp}.log"))
}
