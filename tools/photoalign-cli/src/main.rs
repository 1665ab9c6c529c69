//! Photo Align CLI: cameras, system checks, and headless capture.
//!
//! Usage:
//!   photoalign devices [--all] [--json]   List cameras (or every media device)
//!   photoalign check                      Check system capabilities
//!   photoalign snap [OPTIONS]             Take one photo without a window

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use photoalign_common::config::AppConfig;
use photoalign_common::logging::{init_logging, verbosity_config};

mod commands;

#[derive(Parser)]
#[command(
    name = "photoalign",
    about = "Line up a camera shot against a reference image",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List video input devices in selection order
    Devices {
        /// Include audio devices
        #[arg(long)]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check system capabilities
    Check,

    /// Capture a single photo from a camera
    Snap {
        /// Zero-based position in the `devices` list (default: first)
        #[arg(short, long)]
        device: Option<usize>,

        /// Directory to write the photo to (default: configured export dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds to wait for the camera to deliver a frame
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging = verbosity_config(true);
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Devices { all, json } => commands::devices::run(all, json).await,
        Commands::Check => commands::check::run(),
        Commands::Snap {
            device,
            output,
            timeout,
        } => commands::snap::run(&config, device, output, timeout),
    }
}
