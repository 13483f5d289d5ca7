//! vaultsync CLI - back up a vector collection and restore it on failure.
//!
//! One-shot commands:
//! - `vaultsync export`: copy new records into the backup table
//! - `vaultsync restore`: rebuild the restore collection from the backup
//! - `vaultsync health`: probe the primary, restoring on failure
//!
//! Long-running:
//! - `vaultsync run`: export and health-check on the configured periods

mod commands;
mod scheduler;

use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use clap::ArgMatches;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::Level;
use vaultsync_reconcile::{HealthStatus, Reconciler, RestoreOutcome, SyncConfig, CONFIG_FILE_NAME};

use commands::build_cli;
use scheduler::{run_loop, Schedule};

/// Exit code for configuration or operation failures.
const EXIT_FAILURE: i32 = 1;
/// Exit code for `health` when the primary is unhealthy.
const EXIT_UNHEALTHY: i32 = 2;

fn main() {
    let matches = build_cli().get_matches();

    if let Err(e) = init_logging(&matches) {
        eprintln!("{}", e);
        process::exit(EXIT_FAILURE);
    }

    let config_path = config_path(&matches);

    if let Some(("init-config", sub)) = matches.subcommand() {
        let path = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        process::exit(run_init_config(&path, sub.get_flag("force")));
    }

    let config = match SyncConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let reconciler = match Reconciler::from_config(&config) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let exit_code = match matches.subcommand_name() {
        Some("export") => run_export(&reconciler),
        Some("restore") => run_restore(&reconciler),
        Some("health") => run_health(&reconciler),
        Some("run") => run_scheduled(&reconciler, &config),
        _ => EXIT_FAILURE,
    };
    process::exit(exit_code);
}

/// Run the scheduler until SIGINT or SIGTERM.
fn run_scheduled(reconciler: &Reconciler, config: &SyncConfig) -> i32 {
    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&stop)) {
            eprintln!("Failed to register signal handler: {}", e);
            return EXIT_FAILURE;
        }
    }

    let mut schedule = Schedule::new(
        Instant::now(),
        config.schedule.export_interval(),
        config.schedule.health_interval(),
    );
    run_loop(reconciler, &mut schedule, &stop);
    0
}

fn init_logging(matches: &ArgMatches) -> Result<(), String> {
    let raw = matches
        .get_one::<String>("log-level")
        .map(|s| s.as_str())
        .unwrap_or("info");
    let level = Level::from_str(raw).map_err(|_| format!("Invalid log level '{}'", raw))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// `--config`, else `./vaultsync.toml` if it exists, else none (defaults).
fn config_path(matches: &ArgMatches) -> Option<PathBuf> {
    if let Some(path) = matches.get_one::<String>("config") {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from(CONFIG_FILE_NAME);
    default.exists().then_some(default)
}

fn run_init_config(path: &Path, force: bool) -> i32 {
    let result = if force {
        std::fs::write(path, SyncConfig::default_toml())
            .map(|_| true)
            .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
    } else {
        SyncConfig::write_default_if_missing(path).map_err(|e| e.to_string())
    };
    match result {
        Ok(true) => {
            println!("Wrote {}", path.display());
            0
        }
        Ok(false) => {
            println!("{} already exists (use --force to overwrite)", path.display());
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            EXIT_FAILURE
        }
    }
}

fn run_export(reconciler: &Reconciler) -> i32 {
    match reconciler.export() {
        Ok(report) => {
            println!("export: {}", report);
            0
        }
        Err(e) => {
            eprintln!("export failed: {}", e);
            EXIT_FAILURE
        }
    }
}

fn run_restore(reconciler: &Reconciler) -> i32 {
    match reconciler.restore() {
        Ok(report) => {
            println!(
                "restore into '{}': {}",
                reconciler.config().restore_collection,
                report
            );
            0
        }
        Err(e) => {
            eprintln!("restore failed: {}", e);
            EXIT_FAILURE
        }
    }
}

fn run_health(reconciler: &Reconciler) -> i32 {
    let collection = &reconciler.config().collection_name;
    match reconciler.health_check() {
        HealthStatus::Healthy => {
            println!("'{}' is healthy", collection);
            0
        }
        HealthStatus::Unhealthy { cause, restore } => {
            println!("'{}' is unhealthy: {}", collection, cause);
            match restore {
                RestoreOutcome::Completed(report) => println!("restore: {}", report),
                RestoreOutcome::Failed(e) => println!("restore failed: {}", e),
                RestoreOutcome::Suppressed { retry_in } => println!(
                    "restore suppressed by cooldown, next allowed in {}s",
                    retry_in.as_secs()
                ),
            }
            EXIT_UNHEALTHY
        }
    }
}
