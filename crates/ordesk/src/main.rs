// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordesk - marketplace order desk.
//!
//! This is the binary entry point: the HTTP service, operator account
//! provisioning, and environment diagnostics.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod agent;
mod doctor;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ordesk_config::model::OrdeskConfig;
use ordesk_config::ConfigError;

/// Ordesk - every marketplace order gets a support ticket.
#[derive(Parser, Debug)]
#[command(name = "ordesk", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway and background workers.
    Serve,
    /// Manage support agent accounts.
    Agent {
        #[command(subcommand)]
        action: agent::AgentAction,
    },
    /// Check configuration, database, and assignment state.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

fn load_config(path: Option<&std::path::Path>) -> Result<OrdeskConfig, Vec<ConfigError>> {
    match path {
        Some(path) => ordesk_config::load_and_validate_path(path),
        None => ordesk_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            ordesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Agent { action }) => agent::run_agent(&config, action).await,
        Some(Commands::Doctor { plain }) => {
            doctor::run_doctor(&config, cli.config.as_deref(), plain).await
        }
        None => {
            println!("ordesk: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
