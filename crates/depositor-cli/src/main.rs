//! Command line interface for depositing articles into Zenodo.
//!
//! This crate provides the `depositor` binary on top of the `depositor` library.
//! It reads the frontmatter of Markdown articles, creates or updates one Zenodo
//! deposit per article, uploads the files each article declares and records the
//! deposit in the project configuration.
//!
//! # Usage
//!
//! ```bash
//! # Deposit every article below the current directory as presentations
//! ZENODO_TOKEN=... depositor deposit --file . --type presentation
//!
//! # Try it against the sandbox first
//! ZENODO_TOKEN=... depositor deposit --file talks/keynote.md --sandbox
//!
//! # Deposit and publish in one go
//! ZENODO_TOKEN=... depositor deposit --publish
//! ```
//!
//! Missing arguments are prompted for. Publishing asks for confirmation since it
//! cannot be undone. Use `-v` (repeatable) for more logging detail.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, process::ExitCode};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use depositor::{
  article::collect_articles,
  client::ZenodoClient,
  config::{access_token, Config},
  deposit::{DepositOutcome, Depositor},
  error::DepositorError,
  metadata::UploadType,
};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Deposit Markdown articles into the Zenodo archive")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses `depositor/config.toml` in the
  /// platform-specific config directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Loads the configuration named on the command line, or the default one.
fn load_config(cli: &Cli) -> Result<Config> {
  let path = match &cli.config {
    Some(path) => path.clone(),
    None => match Config::default_path() {
      Some(path) => path,
      None => return Ok(Config::default()),
    },
  };
  trace!("Using configuration at: {}", path.display());
  Ok(Config::load(&path)?)
}

/// Runs the requested command.
async fn run(cli: Cli, interaction: &Interactive) -> Result<()> {
  match cli.command.clone() {
    Commands::Deposit(args) => {
      let config = load_config(&cli)?;
      deposit(interaction, config, args).await?;
    },
  }
  Ok(())
}

/// Entry point for the depositor CLI application
///
/// Parses the command line, sets up logging and runs the requested command.
/// Any failure is reported on stderr and turns into a non-zero exit code.
#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let interaction = Interactive::new(cli.accept_defaults);
  match run(cli, &interaction).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      debug!("Command failed: {error:?}");
      eprintln!("{} {error}", style(ERROR_PREFIX).red());
      ExitCode::FAILURE
    },
  }
}
