//! Unified promo-rs CLI.
//!
//! This binary provides a unified interface to the promo components:
//! - `promo-rs bot` - Run the Telegram bot
//! - `promo-rs store` - Manage subscriber records
//!
//! Each subcommand can also be run as a standalone binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Promo-rs unified CLI.
#[derive(Parser)]
#[command(
    name = "promo-rs",
    version,
    about = "Issue one-time promo codes to new channel subscribers",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot.
    #[command(name = "bot", alias = "run")]
    Bot(Box<promo_bot::BotArgs>),

    /// Manage subscriber records.
    #[command(name = "store")]
    Store(promo_store::StoreArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Bot(args) => promo_bot::cli::run(*args).await,
        Commands::Store(args) => promo_store::cli::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
