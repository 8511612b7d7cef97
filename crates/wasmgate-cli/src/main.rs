//! Command-line driver for the wasmgate bridge.
//!
//! This CLI provides tools for:
//! - Calling a named export of a guest module with a JSON payload
//! - Listing the functions a module exports

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use wasmgate::{BridgeConfig, Loader};

#[derive(Parser)]
#[command(name = "wasmgate")]
#[command(author, version, about = "JSON bridge for WebAssembly guest modules", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a named export with a JSON payload
    Call {
        /// Path to the compiled module image
        module: PathBuf,

        /// Name of the export to invoke
        export: String,

        /// JSON payload to send
        #[arg(short, long, default_value = "{}")]
        payload: String,

        /// Fuel budget for the instance (unmetered if omitted)
        #[arg(long)]
        fuel: Option<u64>,
    },

    /// List the functions a module exports
    Exports {
        /// Path to the compiled module image
        module: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Call {
            module,
            export,
            payload,
            fuel,
        } => cmd_call(module, export, payload, fuel),

        Commands::Exports { module } => cmd_exports(module),
    }
}

fn cmd_call(module: PathBuf, export: String, payload: String, fuel: Option<u64>) -> Result<()> {
    let payload: serde_json::Value =
        serde_json::from_str(&payload).context("payload is not valid JSON")?;

    let mut config = BridgeConfig::default();
    if let Some(fuel) = fuel {
        config = config.fuel_limit(fuel);
    }

    let loader = Loader::new(config)?;
    let image = loader
        .load_file(&module)
        .with_context(|| format!("failed to load {}", module.display()))?;
    let mut instance = loader.instantiate(&image)?;

    info!("calling '{}' on module '{}'", export, image.name());
    let result: serde_json::Value = instance.invoke(&export, &payload)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_exports(module: PathBuf) -> Result<()> {
    let loader = Loader::new(BridgeConfig::default())?;
    let image = loader
        .load_file(&module)
        .with_context(|| format!("failed to load {}", module.display()))?;

    for name in image.exports() {
        println!("{}", name);
    }
    Ok(())
}
