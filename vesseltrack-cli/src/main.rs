//! vesseltrack CLI - read-only HTTP API over an AIS vessel position table
//!
//! `vesseltrack serve` exposes:
//! - `GET /live` - latest position per vessel
//! - `GET /historical?mmsi=..&start=..&end=..` - one vessel's track

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "vesseltrack",
    author,
    version,
    about = "Live and historical AIS vessel positions over HTTP",
    long_about = "Serve the latest position per vessel and per-vessel position history \
                  from a PostgreSQL AIS table as JSON."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so env-backed flags see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
    }

    Ok(())
}
