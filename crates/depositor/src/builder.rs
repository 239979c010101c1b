//! Constructing one deposit record per article.
//!
//! [`build_deposit`] copies the article's own metadata into a
//! [`DepositMetadata`] and then applies the population rule of the requested
//! [`UploadType`]. Each upload type has exactly one rule, chosen by an
//! exhaustive match in [`population_rule`], so a new type-specific behaviour is
//! one new function and one changed match arm.
//!
//! # Examples
//!
//! ```
//! use depositor::{
//!   article::Article, builder::build_deposit, metadata::UploadType, reconcile::reconcile,
//! };
//!
//! let source = "---\ntitle: On Deposits\nabstract: We *deposit* things.\n---\n";
//! let article = Article::parse("paper.md", source, Default::default()).unwrap();
//! let issue = reconcile([&article.frontmatter]).unwrap();
//!
//! let metadata = build_deposit(&article, UploadType::Dataset, &issue).unwrap();
//! assert_eq!(metadata.description, "<p>We <em>deposit</em> things.</p>");
//! ```

use chrono::{DateTime, NaiveDate};
use pulldown_cmark::{html, Options, Parser};

use super::*;
use crate::{
  article::Article,
  metadata::{Contributor, ContributorType, DepositMetadata, RelatedIdentifier, UploadType},
  reconcile::IssueData,
};

/// Custom field holding the article's code repository.
pub const CODE_REPOSITORY_KEY: &str = "code:codeRepository";

/// Adds the fields specific to one upload type.
pub type PopulationRule = fn(&mut DepositMetadata, &Article, &IssueData);

/// Builds the deposit record for one article.
///
/// Fails when the article has no title or no abstract.
pub fn build_deposit(
  article: &Article,
  upload_type: UploadType,
  issue: &IssueData,
) -> Result<DepositMetadata> {
  let frontmatter = &article.frontmatter;
  let title = frontmatter
    .title
    .as_deref()
    .filter(|title| !title.trim().is_empty())
    .ok_or_else(|| missing_field("title", article))?;
  let abstract_text = article
    .abstract_text
    .as_deref()
    .filter(|text| !text.trim().is_empty())
    .ok_or_else(|| missing_field("abstract", article))?;

  let mut metadata = DepositMetadata::new(upload_type, title, render_abstract(abstract_text));
  metadata.publication_date = frontmatter.date.as_deref().map(normalize_date);
  metadata.doi = frontmatter.doi.clone();
  metadata.imprint_publisher =
    issue.venue_short_title().or_else(|| issue.venue_title()).map(str::to_string);
  metadata.creators =
    frontmatter.authors.iter().map(|author| frontmatter.creator_for(author)).collect();
  metadata.keywords = frontmatter.keywords.clone();
  metadata.license = frontmatter.license.as_deref().map(str::to_lowercase);
  metadata.related_identifiers = article.dois.values().map(RelatedIdentifier::cites_doi).collect();

  population_rule(upload_type)(&mut metadata, article, issue);
  trace!("Built deposit for {}: {metadata:?}", article.path.display());
  Ok(metadata)
}

/// The population rule of an upload type.
pub fn population_rule(upload_type: UploadType) -> PopulationRule {
  match upload_type {
    UploadType::Presentation => populate_presentation,
    UploadType::Publication
    | UploadType::Poster
    | UploadType::Dataset
    | UploadType::Image
    | UploadType::Video
    | UploadType::Software
    | UploadType::Lesson
    | UploadType::PhysicalObject
    | UploadType::Other => populate_nothing,
  }
}

/// Conference fields, editors and the code repository.
fn populate_presentation(metadata: &mut DepositMetadata, article: &Article, issue: &IssueData) {
  metadata.conference_title = issue.venue_title().map(str::to_string);
  metadata.conference_acronym = issue.venue_short_title().map(str::to_string);
  metadata.conference_url = issue.venue_url().map(str::to_string);
  metadata.conference_dates = issue.venue_date().map(str::to_string);
  metadata.conference_place = issue.venue_location().map(str::to_string);
  metadata.contributors = issue
    .editors()
    .iter()
    .map(|editor| Contributor {
      person:           editor.clone(),
      contributor_type: ContributorType::Editor,
    })
    .collect();
  if let Some(repository) = &article.frontmatter.github {
    metadata.custom.insert(CODE_REPOSITORY_KEY.to_string(), Value::String(repository.clone()));
  }
}

/// Upload types without type-specific fields.
fn populate_nothing(_: &mut DepositMetadata, _: &Article, _: &IssueData) {}

/// Renders a Markdown abstract to HTML.
pub fn render_abstract(markdown: &str) -> String {
  let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);
  let mut rendered = String::new();
  html::push_html(&mut rendered, parser);
  rendered.trim_end().to_string()
}

/// Normalizes a date to `YYYY-MM-DD`, passing unrecognised forms through.
fn normalize_date(date: &str) -> String {
  let date = date.trim();
  if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
    return parsed.date_naive().format("%Y-%m-%d").to_string();
  }
  ["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y", "%d %b %Y", "%b %d, %Y"]
    .iter()
    .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
    .map(|parsed| parsed.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|| date.to_string())
}

/// Builds the error for a field the deposit cannot do without.
fn missing_field(field: &'static str, article: &Article) -> DepositorError {
  DepositorError::MissingField { field, document: article.path.display().to_string() }
}

#[cfg(test)]
mod tests {
  use serde_yaml::Mapping;

  use super::*;
  use crate::{metadata::Creator, reconcile::reconcile};

  const PRESENTATION: &str = r#"---
title: Fast Deposits
date: 2024-07-10
doi: 10.1000/fast
license: CC-BY-4.0
keywords: [archives]
github: https://github.com/example/fast
authors:
  - name: { family: Doe, given: Jane }
    affiliations: [a1]
    orcid: 0000-0002-1825-0097
affiliations:
  - { id: a1, name: Zenodo }
contributors:
  - id: ed
    name: { family: Itor, given: Ed }
    affiliations: [a1]
editors: [ed]
venue:
  title: Proceedings of X
  short_title: PX
  url: https://x.org
  date: July 8-14, 2024
  location: Tacoma, WA
references:
  smith2020: { doi: 10.1000/smith }
---
# Abstract
We **deposit** things.
"#;

  fn article(source: &str) -> Article { Article::parse("talk.md", source, Mapping::new()).unwrap() }

  fn build(article: &Article, upload_type: UploadType) -> Result<DepositMetadata> {
    let issue = reconcile([&article.frontmatter])?;
    build_deposit(article, upload_type, &issue)
  }

  #[test]
  fn test_presentation_gets_conference_fields() {
    let article = article(PRESENTATION);
    let metadata = build(&article, UploadType::Presentation).unwrap();

    assert_eq!(metadata.title, "Fast Deposits");
    assert_eq!(metadata.description, "<p>We <strong>deposit</strong> things.</p>");
    assert_eq!(metadata.publication_date.as_deref(), Some("2024-07-10"));
    assert_eq!(metadata.imprint_publisher.as_deref(), Some("PX"));
    assert_eq!(metadata.license.as_deref(), Some("cc-by-4.0"));
    assert_eq!(metadata.conference_title.as_deref(), Some("Proceedings of X"));
    assert_eq!(metadata.conference_acronym.as_deref(), Some("PX"));
    assert_eq!(metadata.conference_url.as_deref(), Some("https://x.org"));
    assert_eq!(metadata.conference_dates.as_deref(), Some("July 8-14, 2024"));
    assert_eq!(metadata.conference_place.as_deref(), Some("Tacoma, WA"));
    assert_eq!(metadata.contributors, [Contributor {
      person:           Creator {
        name: "Itor, Ed".into(),
        affiliation: Some("Zenodo".into()),
        ..Default::default()
      },
      contributor_type: ContributorType::Editor,
    }]);
    assert_eq!(
      metadata.custom.get(CODE_REPOSITORY_KEY),
      Some(&Value::String("https://github.com/example/fast".into()))
    );
    assert_eq!(metadata.related_identifiers, [RelatedIdentifier::cites_doi("10.1000/smith")]);
  }

  #[test]
  fn test_presentation_without_venue_has_no_conference_fields() {
    let article = article("---\ntitle: T\nabstract: A\n---\n");
    let metadata = build(&article, UploadType::Presentation).unwrap();
    assert_eq!(metadata.conference_title, None);

    let json = serde_json::to_value(&metadata).unwrap();
    let conference_keys: Vec<&String> =
      json.as_object().unwrap().keys().filter(|key| key.starts_with("conference_")).collect();
    assert!(conference_keys.is_empty(), "unexpected keys: {conference_keys:?}");
  }

  #[test]
  fn test_dataset_has_no_conference_fields() {
    let article = article(PRESENTATION);
    let metadata = build(&article, UploadType::Dataset).unwrap();
    let json = serde_json::to_value(&metadata).unwrap();

    let conference_keys: Vec<&String> =
      json.as_object().unwrap().keys().filter(|key| key.starts_with("conference_")).collect();
    assert!(conference_keys.is_empty(), "unexpected keys: {conference_keys:?}");
    assert!(metadata.contributors.is_empty());
    assert!(metadata.custom.is_empty());
    assert_eq!(metadata.imprint_publisher.as_deref(), Some("PX"));
  }

  #[test]
  fn test_imprint_publisher_falls_back_to_venue_title() {
    let article = article("---\ntitle: T\nabstract: A\nvenue: { title: Proc X }\n---\n");
    let metadata = build(&article, UploadType::Other).unwrap();
    assert_eq!(metadata.imprint_publisher.as_deref(), Some("Proc X"));
  }

  #[test]
  fn test_creator_mapping() {
    let article = article(PRESENTATION);
    let metadata = build(&article, UploadType::Dataset).unwrap();
    assert_eq!(metadata.creators, [Creator {
      name:        "Doe, Jane".into(),
      affiliation: Some("Zenodo".into()),
      orcid:       Some("0000-0002-1825-0097".into()),
      gnd:         None,
    }]);
  }

  #[test]
  fn test_missing_title_fails() {
    let article = article("---\nabstract: Present\nvenue: { title: V }\n---\n");
    assert!(matches!(
      build(&article, UploadType::Presentation),
      Err(DepositorError::MissingField { field: "title", .. })
    ));
  }

  #[test]
  fn test_missing_abstract_fails() {
    let article = article("---\ntitle: Present\nvenue: { title: V }\ndoi: 10.1/x\n---\nBody\n");
    assert!(matches!(
      build(&article, UploadType::Presentation),
      Err(DepositorError::MissingField { field: "abstract", .. })
    ));
  }

  #[test]
  fn test_publication_without_publication_type_is_built() {
    let article = article("---\ntitle: T\nabstract: A\n---\n");
    let metadata = build(&article, UploadType::Publication).unwrap();
    assert_eq!(metadata.upload_type, UploadType::Publication);
    assert_eq!(metadata.publication_type, None);
  }

  #[test]
  fn test_normalize_date() {
    assert_eq!(normalize_date("2024-07-10"), "2024-07-10");
    assert_eq!(normalize_date("2024-07-10T12:00:00Z"), "2024-07-10");
    assert_eq!(normalize_date("10 July 2024"), "2024-07-10");
    assert_eq!(normalize_date("July 10, 2024"), "2024-07-10");
    assert_eq!(normalize_date("Summer 2024"), "Summer 2024");
  }
}
