//! Developer-facing log facade setup.
//!
//! This initializes the `log` macros used for diagnostics across the
//! workspace. The operator-facing session audit trail is a separate pipeline
//! (see [`crate::audit`]) and does not route through here.

use std::io::Write;

const FILTER_ENV: &str = "WINMEDIC_LOG";

/// Initialize the global logger with `default_level` unless `WINMEDIC_LOG`
/// overrides it. Safe to call more than once; later calls are ignored.
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().filter_or(FILTER_ENV, default_level);
    let _ = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();
}
