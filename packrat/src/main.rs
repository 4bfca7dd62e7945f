use anyhow::Result;
use clap::Parser;
use packrat::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing for the CLI.
    tracing_subscriber::fmt::init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");

    tokio::select! {
        result = run(cli) => {
            match &result {
                Ok(_) => tracing::info!("CLI completed successfully"),
                Err(e) => tracing::error!(error = %e, "CLI exited with error"),
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            // Ledger and failure log are flushed per item, so interrupting
            // here can only lose the in-flight attempt.
            tracing::warn!("Operation cancelled by user");
            eprintln!("Operation cancelled by user");
            Ok(())
        }
    }
}
