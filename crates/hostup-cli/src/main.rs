//! hostup - bare host to running service
//!
//! Usage:
//!   hostup                 # Provision this host (requires root)
//!   hostup --format json   # Same, with a machine-readable report
//!   hostup unit            # Print the rendered systemd unit
//!   hostup config          # Print the effective configuration

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostup_core::config::{self, to_toml};
use hostup_core::prelude::*;

#[derive(Parser)]
#[command(name = "hostup")]
#[command(about = "Provision a Linux host and register the application as a service", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./hostup.toml, then the user config dir)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the service unit that provisioning would install
    Unit,
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostup=info,warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(console::colors_enabled())
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let source_root = std::env::current_dir().context("Failed to read the working directory")?;
    let config = config::load(cli.config.as_deref(), &source_root)?;

    match cli.command {
        Some(Commands::Unit) => {
            print!("{}", ServiceUnit::from_config(&config).render());
            Ok(())
        }
        Some(Commands::Config) => {
            print!("{}", to_toml(&config)?);
            Ok(())
        }
        None => run_pipeline(&config, cli.format),
    }
}

fn run_pipeline(config: &ProvisionConfig, format: OutputFormat) -> Result<()> {
    let ctx = ProvisionContext::system()?;
    tracing::info!(
        source = %ctx.source_root().display(),
        install_dir = %config.install_dir().display(),
        "provisioning {}",
        config.app.name
    );

    match Pipeline::new(&ctx, config).run() {
        Ok(report) => {
            match format {
                OutputFormat::Table => output::print_summary(&report),
                OutputFormat::Json => output::print_json(&report)?,
            }
            Ok(())
        }
        Err(failure) => {
            if format == OutputFormat::Json {
                output::print_failure_json(&failure)?;
            }
            Err(failure.into())
        }
    }
}
