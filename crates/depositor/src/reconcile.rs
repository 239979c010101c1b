//! Merging issue-level fields across articles.
//!
//! Articles of the same issue each repeat the venue, volume and issue details
//! in their frontmatter. Reconciliation folds those into a single [`IssueData`]:
//!
//! - Scalar fields resolve to the first value seen, in article order. Any later article that sets
//!   the field to something else is a [`Conflict`].
//! - Editors are not compared. The last article declaring a non-empty `editors` list decides the
//!   editor set, and an article with an empty list leaves it alone.
//!
//! # Examples
//!
//! ```
//! use depositor::{frontmatter::Frontmatter, reconcile::reconcile};
//!
//! let first: Frontmatter = serde_yaml::from_str("venue: { title: Proc X }").unwrap();
//! let second: Frontmatter = serde_yaml::from_str("issue: { number: 2 }").unwrap();
//!
//! let issue = reconcile(&[first, second]).unwrap();
//! assert_eq!(issue.venue_title(), Some("Proc X"));
//! ```

use super::*;
use crate::{frontmatter::Frontmatter, metadata::Creator};

/// An issue-level field shared by all articles of an issue.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueField {
  VenueTitle,
  VenueShortTitle,
  VenueDoi,
  VenueUrl,
  VenueSeries,
  VenueIssn,
  VenueNumber,
  VenueDate,
  VenueLocation,
  VenuePublisher,
  VolumeNumber,
  VolumeDoi,
  VolumeTitle,
  VolumeSubject,
  IssueNumber,
  IssueDoi,
}

impl IssueField {
  /// Every field, in reconciliation order.
  pub const ALL: [IssueField; 16] = [
    IssueField::VenueTitle,
    IssueField::VenueShortTitle,
    IssueField::VenueDoi,
    IssueField::VenueUrl,
    IssueField::VenueSeries,
    IssueField::VenueIssn,
    IssueField::VenueNumber,
    IssueField::VenueDate,
    IssueField::VenueLocation,
    IssueField::VenuePublisher,
    IssueField::VolumeNumber,
    IssueField::VolumeDoi,
    IssueField::VolumeTitle,
    IssueField::VolumeSubject,
    IssueField::IssueNumber,
    IssueField::IssueDoi,
  ];

  /// Frontmatter path of the field, used in conflict messages.
  pub fn name(&self) -> &'static str {
    match self {
      Self::VenueTitle => "venue.title",
      Self::VenueShortTitle => "venue.short_title",
      Self::VenueDoi => "venue.doi",
      Self::VenueUrl => "venue.url",
      Self::VenueSeries => "venue.series",
      Self::VenueIssn => "venue.issn",
      Self::VenueNumber => "venue.number",
      Self::VenueDate => "venue.date",
      Self::VenueLocation => "venue.location",
      Self::VenuePublisher => "venue.publisher",
      Self::VolumeNumber => "volume.number",
      Self::VolumeDoi => "volume.doi",
      Self::VolumeTitle => "volume.title",
      Self::VolumeSubject => "volume.subject",
      Self::IssueNumber => "issue.number",
      Self::IssueDoi => "issue.doi",
    }
  }

  /// Reads the field from one article's frontmatter.
  pub fn extract<'a>(&self, frontmatter: &'a Frontmatter) -> Option<&'a str> {
    let venue = frontmatter.venue.as_ref();
    let volume = frontmatter.volume.as_ref();
    let issue = frontmatter.issue.as_ref();
    match self {
      Self::VenueTitle => venue.and_then(|v| v.title.as_deref()),
      Self::VenueShortTitle => venue.and_then(|v| v.short_title.as_deref()),
      Self::VenueDoi => venue.and_then(|v| v.doi.as_deref()),
      Self::VenueUrl => venue.and_then(|v| v.url.as_deref()),
      Self::VenueSeries => venue.and_then(|v| v.series.as_deref()),
      Self::VenueIssn => venue.and_then(|v| v.issn.as_deref()),
      Self::VenueNumber => venue.and_then(|v| v.number.as_deref()),
      Self::VenueDate => venue.and_then(|v| v.date.as_deref()),
      Self::VenueLocation => venue.and_then(|v| v.location.as_deref()),
      Self::VenuePublisher => venue.and_then(|v| v.publisher.as_deref()),
      Self::VolumeNumber => volume.and_then(|v| v.number.as_deref()),
      Self::VolumeDoi => volume.and_then(|v| v.doi.as_deref()),
      Self::VolumeTitle => volume.and_then(|v| v.title.as_deref()),
      Self::VolumeSubject => volume.and_then(|v| v.subject.as_deref()),
      Self::IssueNumber => issue.and_then(|i| i.number.as_deref()),
      Self::IssueDoi => issue.and_then(|i| i.doi.as_deref()),
    }
  }
}

impl Display for IssueField {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.name()) }
}

/// Two articles disagreeing on an issue-level field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
  /// The field in conflict
  pub field:  IssueField,
  /// The value resolved from an earlier article
  pub first:  String,
  /// The differing value from a later article
  pub second: String,
}

impl From<Conflict> for DepositorError {
  fn from(conflict: Conflict) -> Self {
    DepositorError::Conflict {
      field:  conflict.field.name(),
      first:  conflict.first,
      second: conflict.second,
    }
  }
}

/// Issue-level data resolved across all articles of an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueData {
  /// Resolved scalar fields; absent fields were never set
  values:  BTreeMap<IssueField, String>,
  /// Resolved editors
  editors: Vec<Creator>,
}

impl IssueData {
  /// The resolved value of a field.
  pub fn get(&self, field: IssueField) -> Option<&str> { self.values.get(&field).map(String::as_str) }

  #[allow(missing_docs)]
  pub fn venue_title(&self) -> Option<&str> { self.get(IssueField::VenueTitle) }

  #[allow(missing_docs)]
  pub fn venue_short_title(&self) -> Option<&str> { self.get(IssueField::VenueShortTitle) }

  #[allow(missing_docs)]
  pub fn venue_url(&self) -> Option<&str> { self.get(IssueField::VenueUrl) }

  #[allow(missing_docs)]
  pub fn venue_date(&self) -> Option<&str> { self.get(IssueField::VenueDate) }

  #[allow(missing_docs)]
  pub fn venue_location(&self) -> Option<&str> { self.get(IssueField::VenueLocation) }

  /// Editors from the last article that declared any.
  pub fn editors(&self) -> &[Creator] { &self.editors }
}

/// Folds the articles of an issue into [`IssueData`], collecting every conflict.
///
/// Conflicts are reported field by field in [`IssueField::ALL`] order, and in
/// article order within a field. For a conflicting field the first value is kept.
pub fn fold_issue<'a, I>(articles: I) -> (IssueData, Vec<Conflict>)
where I: IntoIterator<Item = &'a Frontmatter> {
  let articles: Vec<&Frontmatter> = articles.into_iter().collect();
  let mut values = BTreeMap::new();
  let mut conflicts = Vec::new();

  for field in IssueField::ALL {
    let mut resolved: Option<&str> = None;
    for value in articles.iter().filter_map(|article| field.extract(article)) {
      match resolved {
        None => resolved = Some(value),
        Some(first) if first != value => conflicts.push(Conflict {
          field,
          first: first.to_string(),
          second: value.to_string(),
        }),
        Some(_) => {},
      }
    }
    if let Some(value) = resolved {
      trace!("Resolved {field} to \"{value}\"");
      values.insert(field, value.to_string());
    }
  }

  let editors = articles
    .iter()
    .filter(|article| !article.editors.is_empty())
    .last()
    .map(|article| resolve_editors(article))
    .unwrap_or_default();

  (IssueData { values, editors }, conflicts)
}

/// Reconciles the articles of an issue, failing on the first conflict.
pub fn reconcile<'a, I>(articles: I) -> Result<IssueData>
where I: IntoIterator<Item = &'a Frontmatter> {
  let (issue, conflicts) = fold_issue(articles);
  match conflicts.into_iter().next() {
    Some(conflict) => Err(conflict.into()),
    None => Ok(issue),
  }
}

/// Reconciles the articles of an issue, reporting every conflict at once.
pub fn reconcile_all<'a, I>(articles: I) -> core::result::Result<IssueData, Vec<Conflict>>
where I: IntoIterator<Item = &'a Frontmatter> {
  let (issue, conflicts) = fold_issue(articles);
  if conflicts.is_empty() {
    Ok(issue)
  } else {
    Err(conflicts)
  }
}

/// Resolves an article's editor ids against its own contributors and affiliations.
fn resolve_editors(article: &Frontmatter) -> Vec<Creator> {
  article
    .editors
    .iter()
    .filter_map(|id| {
      let editor = article.contributor(id).map(|person| article.creator_for(person));
      if editor.is_none() {
        warn!("Editor \"{id}\" is not listed in contributors; skipping");
      }
      editor
    })
    .collect()
}
