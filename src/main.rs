use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use classpilot::cli::Cli;
use classpilot::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with filters to suppress noisy chromiumoxide errors.
    // These errors are harmless - they occur when Chrome sends CDP events that
    // the library doesn't recognize (common with newer Chrome versions)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default = if cli.verbose {
            EnvFilter::new("info").add_directive("classpilot=debug".parse().unwrap())
        } else {
            EnvFilter::new("info")
        };
        default
            .add_directive("chromiumoxide::conn=warn".parse().unwrap())
            .add_directive("chromiumoxide::handler=warn".parse().unwrap())
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    cli.run().await
}
