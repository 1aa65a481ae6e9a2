//! winmedic command-line interface: privilege gate, wiring, and the
//! interactive maintenance console.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use winmedic_core::config::default_config_path;
use winmedic_core::{
    default_catalog, ensure_elevated, logging, AuditLog, MedicConfig, SessionEngine,
};
use winmedic_system::SystemMaintenanceProvider;

/// Top-level command-line options.
#[derive(Parser, Debug)]
#[command(
    name = "winmedic",
    version,
    about = "Interactive console for diagnosing and repairing a Windows workstation."
)]
struct Cli {
    /// Path to the winmedic configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the session log to this file instead of the default location.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Skip the elevation probe (bench rehearsals only; the operations will
    /// still fail without real elevation).
    #[arg(long)]
    assume_elevated: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a configuration file and list any issues.
    Validate {
        /// Path to the configuration file to validate.
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,
    },
}

/// Entry point: parse arguments and surface errors with an exit code.
fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init("info");
    let cli = Cli::parse();

    if let Some(Commands::Validate { file }) = cli.command {
        return validate(file.unwrap_or_else(default_config_path));
    }

    if cli.assume_elevated {
        env::set_var("WINMEDIC_ASSUME_ELEVATED", "1");
    }

    // The audit log exists before the privilege gate so a refused start
    // still leaves one ERROR entry behind.
    let mut audit = AuditLog::open(cli.log_file.as_deref());
    if let Err(err) = ensure_elevated() {
        audit.error(&err.to_string());
        wait_for_acknowledgment();
        std::process::exit(1);
    }

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = MedicConfig::load_or_bootstrap(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;
    if config.path != config_path {
        println!(
            "Using configuration at {} (pass --config or set WINMEDIC_CONFIG to override).",
            config.path.display()
        );
    }
    for issue in config.validate() {
        println!("configuration issue: {issue}");
    }

    let catalog = default_catalog().context("catalog registration failed")?;
    let provider = SystemMaintenanceProvider::new();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut engine = SessionEngine::new(
        &catalog,
        &config,
        &provider,
        &mut audit,
        stdin.lock(),
        stdout.lock(),
    );
    engine.run()?;
    Ok(())
}

fn validate(path: PathBuf) -> Result<()> {
    let config = MedicConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    let issues = config.validate();
    if issues.is_empty() {
        println!(
            "Configuration valid ({} critical services, drive {}).",
            config.policy.critical_services.len(),
            config.policy.drive
        );
    } else {
        eprintln!("Configuration validation failed:");
        for issue in issues {
            eprintln!("  - {issue}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn wait_for_acknowledgment() {
    print!("Press Enter to exit.");
    io::stdout().flush().ok();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
