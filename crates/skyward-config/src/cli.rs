//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::Config;

/// Skyward command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "skyward", about = "Skyward multiplayer session")]
pub struct CliArgs {
    #[command(subcommand)]
    pub role: Role,

    /// TCP port of the session.
    #[arg(long)]
    pub port: Option<u16>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Which end of the session this process runs.
#[derive(Subcommand, Debug)]
pub enum Role {
    /// Host a session and wait for participants.
    Host,
    /// Join the session hosted at the given address.
    Join {
        /// Host address, e.g. `192.168.0.12`.
        address: String,
    },
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.network.tcp_port = port;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Role::Join { ref address } = args.role {
            self.network.server_address = address.clone();
        }
    }
}
