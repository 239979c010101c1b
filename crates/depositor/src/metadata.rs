//! Deposit record model sent to the archive.
//!
//! A [`DepositMetadata`] is the unit submitted to Zenodo. Its well-known fields
//! are typed so that mistakes show up at compile time, while
//! [`DepositMetadata::extensions`] carries any additional keys the archive
//! accepts (vendor or community extensions) straight through to the wire.
//!
//! Only `upload_type`, `title`, `description` and `creators` are always
//! required. `publication_type` and `image_type` are required by the archive
//! for publications and images respectively, but that requirement is left to
//! the archive to enforce.
//!
//! # Examples
//!
//! ```
//! use depositor::metadata::{Creator, DepositMetadata, UploadType};
//!
//! let mut metadata =
//!   DepositMetadata::new(UploadType::Dataset, "Ocean temperatures", "<p>Daily readings</p>");
//! metadata.creators.push(Creator::new("Doe, Jane"));
//! metadata.extensions.insert("vendor_note".into(), "Collected by buoy".into());
//!
//! let json = serde_json::to_value(&metadata).unwrap();
//! assert_eq!(json["upload_type"], "dataset");
//! assert_eq!(json["vendor_note"], "Collected by buoy");
//! ```

use super::*;

/// Kind of deposit, which decides the archive's conditional requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
  /// Journal articles, books, reports and other written works
  Publication,
  /// Conference posters
  Poster,
  /// Talks and slides, the conference-oriented deposit type
  Presentation,
  /// Data of any kind
  Dataset,
  /// Figures, photos and other images
  Image,
  /// Audio and video recordings
  Video,
  /// Source code and software releases
  Software,
  /// Teaching material
  Lesson,
  /// Physical objects such as samples
  PhysicalObject,
  /// Anything else
  #[default]
  Other,
}

impl UploadType {
  /// Every upload type, in the order the archive documents them.
  pub const ALL: [UploadType; 10] = [
    UploadType::Publication,
    UploadType::Poster,
    UploadType::Presentation,
    UploadType::Dataset,
    UploadType::Image,
    UploadType::Video,
    UploadType::Software,
    UploadType::Lesson,
    UploadType::PhysicalObject,
    UploadType::Other,
  ];

  /// Wire name of the upload type.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Publication => "publication",
      Self::Poster => "poster",
      Self::Presentation => "presentation",
      Self::Dataset => "dataset",
      Self::Image => "image",
      Self::Video => "video",
      Self::Software => "software",
      Self::Lesson => "lesson",
      Self::PhysicalObject => "physicalobject",
      Self::Other => "other",
    }
  }
}

impl Display for UploadType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.as_str()) }
}

impl FromStr for UploadType {
  type Err = DepositorError;

  fn from_str(s: &str) -> Result<Self> {
    let lowered = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|upload_type| upload_type.as_str() == lowered)
      .ok_or_else(|| DepositorError::InvalidUploadType(s.to_owned()))
  }
}

/// Subtype required by the archive when the upload type is [`UploadType::Publication`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationType {
  AnnotationCollection,
  Book,
  Section,
  ConferencePaper,
  DataManagementPlan,
  Article,
  Patent,
  Preprint,
  Deliverable,
  Milestone,
  Proposal,
  Report,
  SoftwareDocumentation,
  TaxonomicTreatment,
  TechnicalNote,
  Thesis,
  WorkingPaper,
  Other,
}

/// Subtype required by the archive when the upload type is [`UploadType::Image`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
  Figure,
  Plot,
  Drawing,
  Diagram,
  Photo,
  Other,
}

/// Access level of the deposited files.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRight {
  Open,
  Embargoed,
  Restricted,
  Closed,
}

/// Role of a [`Contributor`], drawn from the archive's controlled vocabulary.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributorType {
  ContactPerson,
  DataCollector,
  DataCurator,
  DataManager,
  Distributor,
  Editor,
  HostingInstitution,
  Producer,
  ProjectLeader,
  ProjectManager,
  ProjectMember,
  RegistrationAgency,
  RegistrationAuthority,
  RelatedPerson,
  Researcher,
  ResearchGroup,
  RightsHolder,
  Supervisor,
  Sponsor,
  WorkPackageLeader,
  Other,
}

/// Relation between a deposit and another identified resource (DataCite vocabulary).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationType {
  IsCitedBy,
  Cites,
  IsSupplementTo,
  IsSupplementedBy,
  IsContinuedBy,
  Continues,
  IsDescribedBy,
  Describes,
  HasMetadata,
  IsMetadataFor,
  IsNewVersionOf,
  IsPreviousVersionOf,
  IsPartOf,
  HasPart,
  IsReferencedBy,
  References,
  IsDocumentedBy,
  Documents,
  IsCompiledBy,
  Compiles,
  IsVariantFormOf,
  IsOriginalFormOf,
  IsIdenticalTo,
  IsAlternateIdentifier,
  IsReviewedBy,
  Reviews,
  IsDerivedFrom,
  IsSourceOf,
  Requires,
  IsRequiredBy,
  IsObsoletedBy,
  Obsoletes,
}

/// Kind of a [`DateInterval`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateType {
  Collected,
  Valid,
  Withdrawn,
}

/// An author of the deposit. Order within [`DepositMetadata::creators`] is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
  /// Name in `"Family, Given"` form
  pub name:        String,
  /// Comma-separated affiliation names
  #[serde(skip_serializing_if = "Option::is_none")]
  pub affiliation: Option<String>,
  /// ORCID identifier
  #[serde(skip_serializing_if = "Option::is_none")]
  pub orcid:       Option<String>,
  /// GND identifier
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gnd:         Option<String>,
}

impl Creator {
  /// Creates a creator with only a name.
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), ..Default::default() } }
}

/// A non-author participant, such as an editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
  /// Person fields shared with [`Creator`]
  #[serde(flatten)]
  pub person:           Creator,
  /// Role of the contributor
  #[serde(rename = "type")]
  pub contributor_type: ContributorType,
}

/// Another resource the deposit relates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedIdentifier {
  /// The identifier value, e.g. a DOI
  pub identifier:    String,
  /// How the deposit relates to it
  pub relation:      RelationType,
  /// Identifier scheme, e.g. `doi`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scheme:        Option<String>,
  /// Upload type of the related resource
  #[serde(skip_serializing_if = "Option::is_none")]
  pub resource_type: Option<String>,
}

impl RelatedIdentifier {
  /// A `cites` relation to a DOI.
  pub fn cites_doi(doi: impl Into<String>) -> Self {
    Self {
      identifier:    doi.into(),
      relation:      RelationType::Cites,
      scheme:        Some("doi".into()),
      resource_type: None,
    }
  }
}

/// A community the deposit is submitted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
  /// Community identifier
  pub identifier: String,
}

/// A funding grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
  /// Grant identifier, optionally prefixed with the funder DOI
  pub id: String,
}

/// A subject term from a controlled vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  /// Human readable term
  pub term:       String,
  /// Identifier of the term
  pub identifier: String,
  /// Vocabulary scheme
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scheme:     Option<String>,
}

/// A place associated with the deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  /// Latitude
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lat:         Option<f64>,
  /// Longitude
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lon:         Option<f64>,
  /// Place name
  pub place:       String,
  /// Free text description
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// A date or date range associated with the deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
  /// Start date
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start:       Option<String>,
  /// End date
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end:         Option<String>,
  /// Kind of interval
  #[serde(rename = "type")]
  pub date_type:   DateType,
  /// Free text description
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// Metadata of a single deposit.
///
/// Every optional field is omitted from the serialized record when unset, so
/// the archive only ever sees the fields a builder actually populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositMetadata {
  /// Kind of deposit
  pub upload_type:             UploadType,
  /// Required by the archive when `upload_type` is `publication`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub publication_type:        Option<PublicationType>,
  /// Required by the archive when `upload_type` is `image`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image_type:              Option<ImageType>,
  /// Publication date as `YYYY-MM-DD`; the archive defaults it to today
  #[serde(skip_serializing_if = "Option::is_none")]
  pub publication_date:        Option<String>,
  /// Title of the deposit
  pub title:                   String,
  /// Authors, in order
  pub creators:                Vec<Creator>,
  /// Abstract, as HTML
  pub description:             String,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub access_right:            Option<AccessRight>,
  /// License identifier, e.g. `cc-by-4.0`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license:                 Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub embargo_date:            Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub access_conditions:       Option<String>,
  /// An existing DOI for the work
  #[serde(skip_serializing_if = "Option::is_none")]
  pub doi:                     Option<String>,
  /// Ask the archive to reserve a DOI
  #[serde(skip_serializing_if = "Option::is_none")]
  pub prereserve_doi:          Option<bool>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub keywords:                Vec<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:                   Option<String>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub related_identifiers:     Vec<RelatedIdentifier>,
  /// Non-author participants
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub contributors:            Vec<Contributor>,
  /// Formatted reference strings
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub references:              Vec<String>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub communities:             Vec<Community>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub grants:                  Vec<Grant>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub journal_title:           Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub journal_volume:          Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub journal_issue:           Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub journal_pages:           Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conference_title:        Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conference_acronym:      Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conference_dates:        Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conference_place:        Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conference_url:          Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conference_session:      Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub conference_session_part: Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub imprint_publisher:       Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub imprint_isbn:            Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub imprint_place:           Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub partof_title:            Option<String>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub partof_pages:            Option<String>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub thesis_supervisors:      Vec<Creator>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thesis_university:       Option<String>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub subjects:                Vec<Subject>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version:                 Option<String>,
  /// ISO 639 language code
  #[serde(skip_serializing_if = "Option::is_none")]
  pub language:                Option<String>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub locations:               Vec<Location>,
  #[allow(missing_docs)]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dates:                   Vec<DateInterval>,
  #[allow(missing_docs)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method:                  Option<String>,
  /// Custom fields keyed by `<vocabulary>:<field>`, e.g. `code:codeRepository`
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub custom:                  BTreeMap<String, Value>,
  /// Keys outside the recognised set, passed through to the archive unchanged
  #[serde(flatten)]
  pub extensions:              BTreeMap<String, Value>,
}

impl DepositMetadata {
  /// Creates a record holding only the always-required fields.
  pub fn new(
    upload_type: UploadType,
    title: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Self {
      upload_type,
      title: title.into(),
      description: description.into(),
      ..Default::default()
    }
  }
}

/// Request body for creating or updating a deposit: `{ "metadata": ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest<'a> {
  /// The record being submitted
  pub metadata: &'a DepositMetadata,
}
