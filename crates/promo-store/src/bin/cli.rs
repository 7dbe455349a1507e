//! Promo store standalone binary.

use std::process::ExitCode;

use clap::Parser;
use promo_store::{StoreArgs, cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = StoreArgs::parse();

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
