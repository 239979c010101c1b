//! Frontmatter shapes read from source documents.
//!
//! The frontmatter of a document is the YAML block at its top. Only the keys
//! modelled here are read; anything else is ignored. Values that are often
//! written as bare numbers (volume and issue numbers, first pages) are accepted
//! as numbers or strings and kept as strings, so `3` and `"3"` compare equal
//! during reconciliation.
//!
//! # Examples
//!
//! ```
//! use depositor::frontmatter::Frontmatter;
//!
//! let frontmatter: Frontmatter = serde_yaml::from_str(
//!   r#"
//! title: On Deposits
//! authors:
//!   - name: { given: Jane, family: Doe }
//!     affiliations: [a1]
//! affiliations:
//!   - { id: a1, name: Zenodo }
//! volume:
//!   number: 3
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(frontmatter.volume.unwrap().number.as_deref(), Some("3"));
//! ```

use serde::{de::Error as _, Deserializer};

use super::*;
use crate::metadata::Creator;

/// Structured metadata attached to one source document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
  /// Document title
  pub title:         Option<String>,
  /// Shortened title
  pub short_title:   Option<String>,
  /// Publication date
  #[serde(deserialize_with = "deserialize_stringish")]
  pub date:          Option<String>,
  /// DOI of the document itself
  pub doi:           Option<String>,
  /// License identifier, e.g. `CC-BY-4.0`
  pub license:       Option<String>,
  #[allow(missing_docs)]
  pub keywords:      Vec<String>,
  /// Abstract in Markdown, if given in the frontmatter rather than the body
  #[serde(rename = "abstract")]
  pub abstract_text: Option<String>,
  /// Authors, in order
  pub authors:       Vec<Person>,
  /// Other people referred to by id, e.g. from `editors`
  pub contributors:  Vec<Person>,
  /// Ids of the editors, resolved against `contributors`
  pub editors:       Vec<String>,
  /// Affiliations referred to by id from people
  pub affiliations:  Vec<Affiliation>,
  /// Conference or journal the document appears in
  pub venue:         Option<Venue>,
  #[allow(missing_docs)]
  pub volume:        Option<Numbering>,
  #[allow(missing_docs)]
  pub issue:         Option<Numbering>,
  /// First page within the issue, used for ordering
  #[serde(deserialize_with = "deserialize_stringish")]
  pub first_page:    Option<String>,
  /// Files to upload alongside the deposit
  pub downloads:     Vec<Download>,
  /// Code repository URL
  pub github:        Option<String>,
  /// Cited works keyed by citation key
  pub references:    BTreeMap<String, Reference>,
}

/// An author or contributor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPerson")]
pub struct Person {
  /// Id used by `editors` to refer to this person
  pub id:           Option<String>,
  #[allow(missing_docs)]
  pub name:         Name,
  /// Affiliation ids, resolved against [`Frontmatter::affiliations`]
  pub affiliations: Vec<String>,
  #[allow(missing_docs)]
  pub orcid:        Option<String>,
}

/// A person's name, as parts or as a single literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawName")]
pub struct Name {
  #[allow(missing_docs)]
  pub given:   Option<String>,
  #[allow(missing_docs)]
  pub family:  Option<String>,
  /// The name as written, when given as a single string
  pub literal: Option<String>,
}

/// An institution people are affiliated with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Affiliation {
  #[allow(missing_docs)]
  pub id:   String,
  #[allow(missing_docs)]
  #[serde(default)]
  pub name: Option<String>,
}

/// The conference or journal a document belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Venue {
  #[allow(missing_docs)]
  pub title:       Option<String>,
  /// Acronym, e.g. `SciPy`
  pub short_title: Option<String>,
  #[allow(missing_docs)]
  pub doi:         Option<String>,
  #[allow(missing_docs)]
  pub url:         Option<String>,
  #[allow(missing_docs)]
  pub series:      Option<String>,
  #[allow(missing_docs)]
  pub issn:        Option<String>,
  /// Event number, e.g. the 23rd edition
  #[serde(deserialize_with = "deserialize_stringish")]
  pub number:      Option<String>,
  /// Event date or date range
  #[serde(deserialize_with = "deserialize_stringish")]
  pub date:        Option<String>,
  /// Event location
  pub location:    Option<String>,
  #[allow(missing_docs)]
  pub publisher:   Option<String>,
}

/// Volume or issue information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Numbering {
  #[allow(missing_docs)]
  #[serde(deserialize_with = "deserialize_stringish")]
  pub number:  Option<String>,
  #[allow(missing_docs)]
  pub doi:     Option<String>,
  #[allow(missing_docs)]
  pub title:   Option<String>,
  #[allow(missing_docs)]
  pub subject: Option<String>,
}

/// A downloadable attached to the document. Only local `file` entries are uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Download {
  /// Path relative to the project directory
  pub file:  Option<String>,
  /// Remote URL, never uploaded
  pub url:   Option<String>,
  #[allow(missing_docs)]
  pub title: Option<String>,
}

/// A cited work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Reference {
  #[allow(missing_docs)]
  pub doi: Option<String>,
}

/// Accepted spellings of a person.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPerson {
  /// `- Jane Doe`
  Literal(String),
  /// The full mapping form
  Full {
    /// See [`Person::id`]
    #[serde(default)]
    id:           Option<String>,
    /// See [`Person::name`]
    #[serde(default)]
    name:         Name,
    /// See [`Person::affiliations`]
    #[serde(default)]
    affiliations: Vec<String>,
    /// See [`Person::orcid`]
    #[serde(default)]
    orcid:        Option<String>,
  },
}

/// Accepted spellings of a name.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawName {
  /// `name: Jane Doe`
  Literal(String),
  /// `name: { given: Jane, family: Doe }`
  Parts {
    /// See [`Name::given`]
    #[serde(default)]
    given:   Option<String>,
    /// See [`Name::family`]
    #[serde(default)]
    family:  Option<String>,
    /// See [`Name::literal`]
    #[serde(default)]
    literal: Option<String>,
  },
}

impl From<RawPerson> for Person {
  fn from(raw: RawPerson) -> Self {
    match raw {
      RawPerson::Literal(literal) =>
        Person { name: Name::from(RawName::Literal(literal)), ..Default::default() },
      RawPerson::Full { id, name, affiliations, orcid } => Person { id, name, affiliations, orcid },
    }
  }
}

impl From<RawName> for Name {
  fn from(raw: RawName) -> Self {
    match raw {
      RawName::Literal(literal) => {
        let literal = literal.trim().to_string();
        // "Jane van Doe" keeps everything before the last word as the given name
        let (given, family) = match literal.rsplit_once(char::is_whitespace) {
          Some((given, family)) => (Some(given.trim().to_string()), Some(family.to_string())),
          None => (None, Some(literal.clone())),
        };
        Name { given, family, literal: Some(literal) }
      },
      RawName::Parts { given, family, literal } => Name { given, family, literal },
    }
  }
}

impl Name {
  /// The name in `"Family, Given"` form, degrading to whichever parts exist.
  pub fn formatted(&self) -> String {
    match (non_empty(&self.family), non_empty(&self.given)) {
      (Some(family), Some(given)) => format!("{family}, {given}"),
      (Some(family), None) => family.to_string(),
      (None, Some(given)) => non_empty(&self.literal).unwrap_or(given).to_string(),
      (None, None) => non_empty(&self.literal).unwrap_or_default().to_string(),
    }
  }
}

impl Frontmatter {
  /// Comma-joined names of the given affiliation ids.
  ///
  /// Ids that do not resolve to a named affiliation are dropped; `None` when
  /// nothing resolves.
  pub fn affiliation_names(&self, ids: &[String]) -> Option<String> {
    let names: Vec<&str> = ids
      .iter()
      .filter_map(|id| {
        let name = self
          .affiliations
          .iter()
          .find(|affiliation| &affiliation.id == id)
          .and_then(|affiliation| non_empty(&affiliation.name));
        if name.is_none() {
          warn!("Affiliation \"{id}\" does not resolve to a named affiliation; dropping it");
        }
        name
      })
      .collect();
    (!names.is_empty()).then(|| names.join(", "))
  }

  /// Maps a person of this document to a deposit [`Creator`].
  pub fn creator_for(&self, person: &Person) -> Creator {
    Creator {
      name:        person.name.formatted(),
      affiliation: self.affiliation_names(&person.affiliations),
      orcid:       person.orcid.clone(),
      gnd:         None,
    }
  }

  /// Looks up a contributor by id.
  pub fn contributor(&self, id: &str) -> Option<&Person> {
    self.contributors.iter().find(|person| person.id.as_deref() == Some(id))
  }
}

/// Treats empty strings like missing values.
fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|value| !value.trim().is_empty())
}

/// Deserializes a scalar that may be written as a string, number or boolean into a string.
fn deserialize_stringish<'de, D>(deserializer: D) -> core::result::Result<Option<String>, D::Error>
where D: Deserializer<'de> {
  match Option::<serde_yaml::Value>::deserialize(deserializer)? {
    None | Some(serde_yaml::Value::Null) => Ok(None),
    Some(serde_yaml::Value::String(value)) => Ok(Some(value)),
    Some(serde_yaml::Value::Number(value)) => Ok(Some(value.to_string())),
    Some(serde_yaml::Value::Bool(value)) => Ok(Some(value.to_string())),
    Some(other) => Err(D::Error::custom(format!("expected a string or number, found {other:?}"))),
  }
}
