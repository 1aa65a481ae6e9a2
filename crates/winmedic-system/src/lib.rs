//! Maintenance provider backed by the operating system's own tools.
//!
//! Keeps all shell integration behind [`SystemMaintenanceProvider`] so the
//! engine in `winmedic-core` stays testable against stub providers.

mod command;
mod system;

pub use system::SystemMaintenanceProvider;
