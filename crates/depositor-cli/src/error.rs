//! Error types for the depositor CLI.

use thiserror::Error;

use super::*;

/// Error type alias used for the CLI.
pub type Result<T> = core::result::Result<T, DepositorCliError>;

/// Errors that can occur while running a CLI command.
#[derive(Error, Debug)]
pub enum DepositorCliError {
  /// A library operation failed.
  #[error(transparent)]
  Depositor(#[from] DepositorError),

  /// Reading an answer from the terminal failed.
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// Writing to the terminal failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}
