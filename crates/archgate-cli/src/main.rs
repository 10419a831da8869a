//! archgate CLI tool.
//!
//! Usage:
//! ```bash
//! archgate check [OPTIONS] [PATH]
//! archgate index [OPTIONS] [PATH]
//! archgate list-rules
//! archgate init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use config_resolver::ResolvedConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Architecture conformance checks over a compiled symbol snapshot
#[derive(Parser)]
#[command(name = "archgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run conformance rules and write reports
    Check {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Symbol snapshot written by the compiler front end
        #[arg(short, long, env = "ARCHGATE_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// Report output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific rules (comma-separated)
        #[arg(long)]
        rules: Option<String>,

        /// Rule preset when --rules is absent: recommended or minimal
        #[arg(long, default_value = "recommended")]
        preset: String,

        /// Skip per-violation artifact files
        #[arg(long)]
        no_artifacts: bool,
    },

    /// Build the global base-type index and print it
    Index {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Symbol snapshot written by the compiler front end
        #[arg(short, long, env = "ARCHGATE_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,

        /// Rule preset to enable: recommended or minimal
        #[arg(long, default_value = "recommended")]
        preset: String,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Consolidated report as JSON.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            snapshot,
            output_dir,
            format,
            rules,
            preset,
            no_artifacts,
        } => {
            let resolved = ResolvedConfig::load(&path, cli.config.as_deref())?;
            let blocked = commands::check::run(
                &resolved,
                &commands::check::CheckOptions {
                    snapshot,
                    output_dir,
                    format,
                    rules,
                    preset: Some(preset),
                    artifacts: !no_artifacts,
                },
            )?;
            if blocked {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Index {
            path,
            snapshot,
            json,
        } => {
            let resolved = ResolvedConfig::load(&path, cli.config.as_deref())?;
            commands::index::run(&resolved, snapshot.as_deref(), json)
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(())
        }
        Commands::Init { force, preset } => commands::init::run(force, &preset),
    }
}
