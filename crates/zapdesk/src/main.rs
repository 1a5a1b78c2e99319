// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zapdesk - WhatsApp customer-service dashboard backend.
//!
//! This is the binary entry point for the Zapdesk service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod status;

/// Zapdesk - WhatsApp customer-service dashboard backend.
#[derive(Parser, Debug)]
#[command(name = "zapdesk", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Zapdesk gateway server.
    Serve,
    /// Show the resolved configuration.
    Config,
    /// Show per-channel storage status.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match zapdesk_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            zapdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config) => {
            print_config(&config);
            Ok(())
        }
        Some(Commands::Status) => status::run_status(&config).await,
        None => {
            println!("zapdesk: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Print the resolved configuration summary for `zapdesk config`.
fn print_config(config: &zapdesk_config::ZapdeskConfig) {
    println!();
    println!("  zapdesk config");
    println!("  {}", "-".repeat(35));
    println!("    Database: {}", config.storage.database_path);
    println!(
        "    Bind:     {}:{}",
        config.server.host, config.server.port
    );
    println!("    Channels: {}", config.channels.len());
    for channel in &config.channels {
        println!("      - {} (table: {})", channel.id, channel.table_name());
    }
    if config.server.bearer_token.is_none() {
        println!();
        println!("  warning: no bearer token set -- all API requests will be rejected");
    }
    println!();
}
