//! Operation catalog: the static selector table the menu renders and
//! dispatches against.
//!
//! Closed after startup; the menu loop and the help viewer both read from
//! the same entries so they can never disagree about what is offered.

use crate::error::{MedicError, MedicResult};
use crate::task::MaintenanceTask;

/// What choosing a menu entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Invoke a maintenance operation through the wrapper.
    Run(MaintenanceTask),
    /// Render the catalog with per-operation descriptions.
    ShowHelp,
    /// Leave the loop and flush the session summary.
    Quit,
}

/// One selectable line of the menu.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub selector: String,
    pub label: String,
    pub action: MenuAction,
}

/// Ordered, startup-only registry of menu entries.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<MenuEntry>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    /// Register an entry. Selector collisions are a configuration error and
    /// abort startup rather than silently overwriting.
    pub fn register(
        &mut self,
        selector: impl Into<String>,
        label: impl Into<String>,
        action: MenuAction,
    ) -> MedicResult<()> {
        let selector = selector.into();
        if self.lookup(&selector).is_some() {
            return Err(MedicError::Catalog(format!(
                "selector `{selector}` registered twice"
            )));
        }
        self.entries.push(MenuEntry {
            selector,
            label: label.into(),
            action,
        });
        Ok(())
    }

    /// Case-insensitive selector lookup; `None` means an invalid selection.
    pub fn lookup(&self, selector: &str) -> Option<&MenuEntry> {
        let wanted = selector.trim();
        self.entries
            .iter()
            .find(|entry| entry.selector.eq_ignore_ascii_case(wanted))
    }

    /// Entries sorted for display: numeric selectors first in ascending
    /// numeric order, then the rest lexically, case-insensitive.
    pub fn ordered_entries(&self) -> Vec<&MenuEntry> {
        let mut ordered: Vec<&MenuEntry> = self.entries.iter().collect();
        ordered.sort_by_key(|entry| selector_order_key(&entry.selector));
        ordered
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pure sort key: numeric selectors sort before alphabetic ones, numerics by
/// value, the rest by lowercased text. Independent of container order.
pub fn selector_order_key(selector: &str) -> (bool, u64, String) {
    match selector.trim().parse::<u64>() {
        Ok(value) => (false, value, String::new()),
        Err(_) => (true, 0, selector.trim().to_ascii_lowercase()),
    }
}

/// The stock console catalog: every maintenance task plus help and quit.
pub fn default_catalog() -> MedicResult<Catalog> {
    let mut catalog = Catalog::new();
    for task in MaintenanceTask::ALL {
        catalog.register(task.selector(), task.label(), MenuAction::Run(task))?;
    }
    catalog.register("h", "Explain the available operations", MenuAction::ShowHelp)?;
    catalog.register("q", "Quit and show the session summary", MenuAction::Quit)?;
    Ok(catalog)
}
