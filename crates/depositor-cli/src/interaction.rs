//! Prompts and styled replies on the terminal.

use console::Term;
use dialoguer::{Confirm, Input, Select};

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "⚠️ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for user prompts
pub static PROMPT_PREFIX: &str = "❯ ";
/// Continuation line for tree structure
pub static CONTINUE_PREFIX: &str = "│  ";
/// Leaf character for tree structure (end of branch)
pub static TREE_LEAF: &str = "└";

/// What a command reports back to the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// The result of depositing one article
  Outcome(&'a DepositOutcome),
  #[allow(missing_docs)]
  Success(&'a str),
  #[allow(missing_docs)]
  Info(&'a str),
  #[allow(missing_docs)]
  Warning(&'a str),
}

/// How commands talk to the user.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;

  /// Asks for a line of text, offering `default`.
  fn prompt(&self, message: &str, default: &str) -> Result<String>;

  /// Asks to pick one of `items`, returning its index.
  fn select(&self, message: &str, items: &[&str], default: usize) -> Result<usize>;

  /// Shows a response.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Terminal interaction through `dialoguer`.
#[derive(Debug, Default)]
pub struct Interactive {
  /// Answer every prompt with its default without asking.
  accept_defaults: bool,
}

impl Interactive {
  /// Creates a terminal interaction.
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults } }
}

impl UserInteraction for Interactive {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).yellow()))
        .default(false)
        .interact()?,
    )
  }

  fn prompt(&self, message: &str, default: &str) -> Result<String> {
    if self.accept_defaults {
      return Ok(default.to_string());
    }
    Ok(
      Input::<String>::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).yellow()))
        .default(default.to_string())
        .interact_text()?,
    )
  }

  fn select(&self, message: &str, items: &[&str], default: usize) -> Result<usize> {
    if self.accept_defaults {
      return Ok(default);
    }
    Ok(
      Select::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).yellow()))
        .items(items)
        .default(default)
        .interact()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    let term = Term::stdout();
    match content {
      ResponseContent::Outcome(outcome) => {
        let action = if outcome.created { "Created" } else { "Updated" };
        term.write_line(&format!(
          "{}{action} deposit {} for {}",
          style(SUCCESS_PREFIX).green(),
          style(outcome.deposit_id).cyan(),
          style(&outcome.title).white().bold()
        ))?;
        for file in &outcome.files {
          term.write_line(&format!(
            "{}uploaded {} ({} bytes)",
            style(CONTINUE_PREFIX).dim(),
            style(&file.key).yellow(),
            file.size
          ))?;
        }
        if outcome.published.is_some() {
          term.write_line(&format!("{}published", style(CONTINUE_PREFIX).dim()))?;
        }
        term.write_line(&format!("{} {}", style(TREE_LEAF).dim(), style(&outcome.url).blue()))?;
      },
      ResponseContent::Success(message) =>
        term.write_line(&format!("{}{message}", style(SUCCESS_PREFIX).green()))?,
      ResponseContent::Info(message) =>
        term.write_line(&format!("{}{message}", style(INFO_PREFIX).blue()))?,
      ResponseContent::Warning(message) =>
        term.write_line(&format!("{}{message}", style(WARNING_PREFIX).yellow()))?,
    }
    Ok(())
  }
}
