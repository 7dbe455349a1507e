//! Promo bot standalone binary.

use std::process::ExitCode;

use clap::Parser;
use promo_bot::{BotArgs, cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = BotArgs::parse();

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
