use super::*;

pub mod deposit;

pub use deposit::{deposit, DepositArgs};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Create or update one deposit per article and upload its files
  Deposit(DepositArgs),
}
