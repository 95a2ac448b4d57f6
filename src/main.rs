//! # mason CLI Entry Point
//!
//! Parses CLI arguments with clap and routes commands into the library.

use anyhow::Result;
use clap::{Parser, Subcommand};

use mason::build;
use mason::config;
use mason::ui;

#[derive(Parser)]
#[command(name = "mason")]
#[command(about = "Incremental C/C++ build orchestrator", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Only report warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the current project
    Build {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
    },
    /// Compile and run the output binary
    Run {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
        /// Arguments passed to the target program
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Remove the build directory
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.quiet {
        ui::set_min_level(ui::Level::Warning);
    }

    match cli.command {
        Commands::Build { release } => {
            let config = config::load_config()?;
            if !build::build_project(&config, release)? {
                std::process::exit(1);
            }
        }
        Commands::Run { release, args } => {
            let config = config::load_config()?;
            build::build_and_run(&config, release, &args)?;
        }
        Commands::Clean => build::clean()?,
    }
    Ok(())
}
