//! Deposit locally authored articles into the Zenodo archive.
//!
//! `depositor` maps the frontmatter of Markdown articles (title, authors,
//! abstract, venue and issue metadata) into Zenodo deposit records, uploads the
//! files each article declares, and records the assigned deposit back into the
//! article's local project configuration so later runs update the same record.
//!
//! # Features
//!
//! - **Frontmatter loading**: YAML frontmatter with project-level defaults
//! - **Issue reconciliation**: venue, volume, issue and conference fields are merged across all
//!   articles of an issue, and any disagreement is reported as a conflict
//! - **Typed deposit records**: every known Zenodo metadata field is typed, with an open map for
//!   vendor extensions
//! - **Create-or-update**: a locally recorded deposit binding decides whether a run creates a new
//!   deposit or revises the existing one
//!
//! # Getting Started
//!
//! ```no_run
//! use depositor::{
//!   article::collect_articles,
//!   client::{ArchiveEnvironment, ZenodoClient},
//!   deposit::Depositor,
//!   metadata::UploadType,
//!   prelude::*,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let token = std::env::var("ZENODO_TOKEN")?;
//!   let client = ZenodoClient::new(&token, ArchiveEnvironment::Sandbox)?;
//!
//!   let articles = collect_articles("papers/")?;
//!   let outcomes = Depositor::new(client, UploadType::Presentation).run(articles).await?;
//!   for outcome in outcomes {
//!     println!("{} -> {}", outcome.title, outcome.deposit_id);
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`metadata`]: Deposit record model sent to the archive
//! - [`frontmatter`]: Frontmatter shapes read from source documents
//! - [`article`]: Loading and collecting article contexts
//! - [`reconcile`]: Merging issue-level fields across articles
//! - [`builder`]: Constructing one deposit record per article
//! - [`client`]: Zenodo REST client and the [`client::Archive`] seam
//! - [`binding`]: The local deposit binding in project configuration
//! - [`deposit`]: The sequential deposit run
//! - [`config`]: User configuration and access token lookup

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::BTreeMap,
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod article;
pub mod binding;
pub mod builder;
pub mod client;
pub mod config;
pub mod deposit;
pub mod error;
pub mod frontmatter;
pub mod metadata;
pub mod reconcile;

use crate::error::*;

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use depositor::prelude::*;
///
/// fn example() -> Result<(), DepositorError> {
///   let token = depositor::config::access_token()?;
///   println!("token has {} characters", token.len());
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{client::Archive, error::DepositorError};
}
