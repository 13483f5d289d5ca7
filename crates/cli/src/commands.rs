//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("vaultsync")
        .about("Incremental backup and self-healing restore for a vector collection")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file (default: ./vaultsync.toml if present)")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log level: error, warn, info, debug, trace")
                .default_value("info")
                .global(true),
        )
        .subcommand(Command::new("export").about("Back up records not yet in the backup table"))
        .subcommand(
            Command::new("restore").about("Rebuild the restore collection from the backup table"),
        )
        .subcommand(
            Command::new("health")
                .about("Probe the primary collection; restore from backup if it fails"),
        )
        .subcommand(
            Command::new("run").about("Run export and health checks on their configured periods"),
        )
        .subcommand(
            Command::new("init-config")
                .about("Write a commented default config file")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help("Overwrite an existing file")
                        .action(ArgAction::SetTrue),
                ),
        )
}
