//! The interactive session: menu loop state machine plus the uniform
//! wrapper every operation invocation passes through.
//!
//! The loop is synchronous and single-threaded. It blocks at exactly three
//! points: the selector prompt, the confirmation prompt, and the
//! continue prompt. One operation runs at a time and always returns control
//! here, whatever its outcome.

mod privilege;
#[cfg(test)]
mod tests;

pub use privilege::ensure_elevated;

use crate::audit::AuditLog;
use crate::catalog::{Catalog, MenuAction};
use crate::config::MedicConfig;
use crate::error::MedicResult;
use crate::ledger::SessionLedger;
use crate::provider::MaintenanceProvider;
use crate::task::{MaintenanceTask, Outcome};
use log::debug;
use std::io::{BufRead, Write};

const SUMMARY_HEADING: &str = "Session summary";

/// The interactive console engine.
///
/// Input and output are injected so the whole loop can run against buffers
/// in tests; the binary hands it locked stdin/stdout.
pub struct SessionEngine<'a, P, R, W>
where
    P: MaintenanceProvider,
    R: BufRead,
    W: Write,
{
    catalog: &'a Catalog,
    config: &'a MedicConfig,
    provider: &'a P,
    audit: &'a mut AuditLog,
    ledger: SessionLedger,
    input: R,
    output: W,
}

impl<'a, P, R, W> SessionEngine<'a, P, R, W>
where
    P: MaintenanceProvider,
    R: BufRead,
    W: Write,
{
    pub fn new(
        catalog: &'a Catalog,
        config: &'a MedicConfig,
        provider: &'a P,
        audit: &'a mut AuditLog,
        input: R,
        output: W,
    ) -> Self {
        SessionEngine {
            catalog,
            config,
            provider,
            audit,
            ledger: SessionLedger::new(),
            input,
            output,
        }
    }

    /// Run the menu loop until the quit selector, then flush the session
    /// summary. Privilege verification must already have happened; the
    /// engine never re-checks it.
    pub fn run(&mut self) -> MedicResult<()> {
        self.audit.info("Maintenance console session started");

        loop {
            self.render_menu()?;
            let line = match self.read_line()? {
                Some(line) => line,
                // stdin closed: treat as the quit selector instead of spinning
                None => break,
            };
            let selection = line.trim().to_string();
            debug!("operator selected `{selection}`");

            let action = self.catalog.lookup(&selection).map(|entry| entry.action);
            match action {
                None => {
                    writeln!(
                        self.output,
                        "`{selection}` is not one of the listed options."
                    )?;
                }
                Some(MenuAction::Run(task)) => {
                    self.invoke(task)?;
                }
                Some(MenuAction::ShowHelp) => self.show_help()?,
                Some(MenuAction::Quit) => break,
            }
        }

        self.finish()
    }

    /// The uniform execution contract: confirmation gate, section banner,
    /// body, then exactly one audit entry and one ledger entry, and an
    /// unconditional continue prompt. Operation bodies do none of this
    /// bookkeeping themselves.
    fn invoke(&mut self, task: MaintenanceTask) -> MedicResult<Outcome> {
        let label = task.label();

        if task.requires_confirmation() && !self.confirm(label)? {
            writeln!(self.output, "CANCELLED: {label}")?;
            self.audit
                .warn(&format!("Action cancelled by operator: {label}"));
            self.ledger.record(format!("[cancelled] {label}"));
            self.pause()?;
            return Ok(Outcome::Cancelled);
        }

        writeln!(self.output)?;
        writeln!(self.output, "==== {label} ====")?;

        let outcome = match task.run(self.provider, self.config) {
            Ok(lines) => {
                for line in &lines {
                    writeln!(self.output, "  {line}")?;
                }
                writeln!(self.output, "SUCCESS: {label}")?;
                self.audit.info(&format!("{label} completed"));
                self.ledger.record(format!("[ok] {label}"));
                Outcome::Success
            }
            Err(err) => {
                let detail = err.to_string();
                writeln!(self.output, "FAILURE: {label} ({detail})")?;
                self.audit.error(&format!("{label} failed: {detail}"));
                self.ledger.record(format!("[failed] {label}: {detail}"));
                Outcome::Failure(detail)
            }
        };

        self.pause()?;
        Ok(outcome)
    }

    /// Single-question gate for state-changing operations. Only the token
    /// `y` (any case, surrounding whitespace ignored) affirms; every other
    /// answer, including an empty line or a spelled-out `yes`, declines.
    fn confirm(&mut self, label: &str) -> MedicResult<bool> {
        write!(self.output, "{label} will modify this system. Proceed? [y/N]: ")?;
        self.output.flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }

    /// One blocking line read; `None` means the input stream is closed.
    fn read_line(&mut self) -> MedicResult<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    fn pause(&mut self) -> MedicResult<()> {
        write!(self.output, "Press Enter to return to the menu.")?;
        self.output.flush()?;
        let _ = self.read_line()?;
        writeln!(self.output)?;
        Ok(())
    }

    fn render_menu(&mut self) -> MedicResult<()> {
        writeln!(self.output)?;
        writeln!(self.output, "winmedic workstation maintenance console")?;
        writeln!(self.output, "Session log: {}", self.audit.path().display())?;
        for entry in self.catalog.ordered_entries() {
            writeln!(self.output, "  [{:>2}] {}", entry.selector, entry.label)?;
        }
        write!(self.output, "Select an option: ")?;
        self.output.flush()?;
        Ok(())
    }

    /// Help/About: the same catalog the menu renders, with descriptions.
    fn show_help(&mut self) -> MedicResult<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Available operations")?;
        for entry in self.catalog.ordered_entries() {
            match entry.action {
                MenuAction::Run(task) => {
                    writeln!(self.output, "  [{:>2}] {}", entry.selector, entry.label)?;
                    writeln!(self.output, "       {}", task.description())?;
                    if task.requires_confirmation() {
                        writeln!(self.output, "       Asks for confirmation before running.")?;
                    }
                }
                MenuAction::ShowHelp | MenuAction::Quit => {
                    writeln!(self.output, "  [{:>2}] {}", entry.selector, entry.label)?;
                }
            }
        }
        self.pause()?;
        Ok(())
    }

    /// Quit path: summary to console and log, the closing audit entry, and
    /// the log location for the operator to hand back.
    fn finish(&mut self) -> MedicResult<()> {
        writeln!(self.output)?;
        writeln!(self.output, "---- {SUMMARY_HEADING} ----")?;
        if self.ledger.is_empty() {
            writeln!(self.output, "No actions were performed this session.")?;
        } else {
            for entry in self.ledger.entries() {
                writeln!(self.output, "{entry}")?;
            }
        }
        self.audit.append_summary(SUMMARY_HEADING, self.ledger.entries());

        self.audit.info("Exiting maintenance console");
        writeln!(self.output, "Session log: {}", self.audit.path().display())?;
        self.output.flush()?;
        Ok(())
    }
}
