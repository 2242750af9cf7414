//! micropebble - headless companion core for Pebble-family smartwatches.
//!
//! This is the binary entry point. All coordination logic lives in the
//! workspace crates; this file only parses the CLI and wires services.

use clap::Parser;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    micropebble_core::logging::init()?;

    let cli = Cli::parse();
    cli.run().await?;
    Ok(())
}
