// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waypin - backend for a social location board.
//!
//! This is the binary entry point: the HTTP gateway, one-shot geocoding
//! and a configuration dump.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod geocode;
mod serve;
mod shutdown;

use clap::{Parser, Subcommand};
use waypin_core::WaypinError;

/// Waypin - backend for a social location board.
#[derive(Parser, Debug)]
#[command(name = "waypin", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Resolve a place name once and print the candidates.
    Geocode {
        /// Free-text place name, e.g. "Lisbon".
        query: String,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match waypin_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            waypin_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Geocode { query }) => geocode::run_geocode(&config, &query).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("waypin: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("waypin: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &waypin_config::WaypinConfig) -> Result<(), WaypinError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| WaypinError::Config(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}
