// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vpnshop - Telegram storefront for VPN subscriptions.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vpnshop_config::{ConfigError, VpnshopConfig};

/// Vpnshop - Telegram storefront for VPN subscriptions.
#[derive(Parser, Debug)]
#[command(name = "vpnshop", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default).
    Serve,
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<VpnshopConfig, Vec<ConfigError>> {
    match path {
        Some(path) => vpnshop_config::load_and_validate_path(path),
        None => vpnshop_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            vpnshop_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Err(errors) = vpnshop_config::validate_for_serve(&config) {
        vpnshop_config::render_errors(&errors);
        std::process::exit(1);
    }

    match cli.command {
        Some(Commands::CheckConfig) => {
            eprintln!(
                "vpnshop: config ok (master.base_url={}, database={})",
                config.master.base_url, config.storage.database_path
            );
        }
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}
