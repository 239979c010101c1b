//! Error types for the depositor library.
//!
//! Every failure of a deposit run surfaces as a [`DepositorError`]. The variants
//! fall into a handful of kinds:
//! - Configuration problems caught before any work starts (missing token)
//! - Input problems with the source documents (missing title or abstract)
//! - Conflicts between articles that share an issue
//! - Remote service and transport failures
//! - File uploads that failed twice in a row
//!
//! # Examples
//!
//! ```
//! use depositor::{error::DepositorError, frontmatter::Frontmatter, reconcile::reconcile};
//!
//! let articles: Vec<Frontmatter> = Vec::new();
//! match reconcile(&articles) {
//!   Err(DepositorError::Conflict { field, first, second }) =>
//!     println!("{field}: {first:?} vs {second:?}"),
//!   Err(e) => println!("Other error: {e}"),
//!   Ok(issue) => println!("Resolved venue: {:?}", issue.venue_title()),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`depositor`](crate) crate.
pub type Result<T> = core::result::Result<T, DepositorError>;

/// Errors that can occur while preparing or submitting deposits.
#[derive(Error, Debug)]
pub enum DepositorError {
  /// The environment or configuration is unusable, e.g. no access token was supplied.
  #[error("{0}")]
  Config(String),

  /// A document lacks a field the deposit record cannot do without.
  ///
  /// Raised for a missing `title` or a missing abstract, before any network
  /// call is made for that document.
  #[error("Document \"{document}\" is missing the required field `{field}`")]
  MissingField {
    /// Name of the missing field.
    field:    &'static str,
    /// The document the field was expected in.
    document: String,
  },

  /// No source documents were found for the run.
  #[error("No source documents found at {0}")]
  NoArticles(String),

  /// The requested upload type is not one the archive recognises.
  #[error("Invalid upload type \"{0}\", see `depositor::metadata::UploadType`")]
  InvalidUploadType(String),

  /// A document's frontmatter could not be parsed.
  #[error("Failed to parse frontmatter in {path}: {source}")]
  Frontmatter {
    /// The offending document.
    path:   String,
    /// The underlying YAML error.
    source: serde_yaml::Error,
  },

  /// Two articles of the same issue disagree on an issue-level field.
  #[error("Conflicting values for `{field}`: \"{first}\" and \"{second}\"")]
  Conflict {
    /// The issue-level field in conflict, e.g. `venue.title`.
    field:  &'static str,
    /// The value resolved from the earlier article.
    first:  String,
    /// The differing value from a later article.
    second: String,
  },

  /// The archive answered with a non-success status.
  #[error("Archive returned {status}: {body}")]
  Api {
    /// HTTP status code of the response.
    status: u16,
    /// Raw response body.
    body:   String,
  },

  /// The archive did not report an upload bucket for a deposit.
  #[error("Deposit {0} has no upload bucket")]
  MissingBucket(u64),

  /// A request to the archive got no response.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A file upload failed on both the first attempt and the retry.
  #[error("Failed to upload {file}: {source}")]
  Upload {
    /// The local file that could not be uploaded.
    file:   String,
    /// The error from the second attempt.
    source: Box<DepositorError>,
  },

  /// The recorded deposit binding in a project configuration is unreadable.
  #[error("Invalid deposit binding: {0}")]
  InvalidBinding(String),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// JSON (de)serialization failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// YAML parsing failed outside of document frontmatter.
  #[error(transparent)]
  Yaml(#[from] serde_yaml::Error),

  /// The user configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A URL could not be parsed or joined.
  #[error(transparent)]
  Url(#[from] url::ParseError),

  /// A glob pattern for document collection was invalid.
  #[error(transparent)]
  Glob(#[from] glob::PatternError),
}
