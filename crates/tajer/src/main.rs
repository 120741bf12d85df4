// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tajer - a multilingual WhatsApp commerce bot for small shops.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod config_cmd;
mod import;
mod serve;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tajer_config::TajerConfig;

/// Tajer - a multilingual WhatsApp commerce bot.
#[derive(Parser, Debug)]
#[command(name = "tajer", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the WhatsApp webhook server.
    Serve,
    /// Chat with the bot from the terminal as a given customer.
    Shell {
        /// Customer phone number to impersonate.
        #[arg(long)]
        phone: String,
    },
    /// Upsert catalog products from a CSV file.
    ImportProducts {
        /// CSV with columns code,name,price,quantity[,category,image_url].
        path: PathBuf,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
}

fn load_config(path: Option<&std::path::Path>) -> TajerConfig {
    let loaded = match path {
        Some(path) => tajer_config::load_and_validate_path(path),
        None => tajer_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            tajer_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.shop.log_level);
            serve::run_serve(config).await
        }
        Some(Commands::Shell { phone }) => {
            // Keep the REPL readable: only warnings reach the terminal.
            init_tracing("warn");
            shell::run_shell(config, &phone).await
        }
        Some(Commands::ImportProducts { path }) => {
            init_tracing(&config.shop.log_level);
            import::run_import(config, &path).await
        }
        Some(Commands::Config) => config_cmd::run_config(&config),
        None => {
            println!("tajer: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tajer={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
