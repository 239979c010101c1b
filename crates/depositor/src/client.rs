//! Zenodo REST client and the [`Archive`] seam.
//!
//! [`ZenodoClient`] is a thin wrapper over the deposition API. Each operation is
//! a single awaited request (file uploads take two), authenticated with an
//! access token passed as the `access_token` query parameter. The client never
//! retries; retry policy belongs to the caller.
//!
//! Failures map onto [`DepositorError`]:
//! - a non-success status becomes [`DepositorError::Api`] with the status and raw body
//! - a request without a response becomes [`DepositorError::Network`]
//!
//! # Examples
//!
//! ```no_run
//! use depositor::{
//!   client::{Archive, ArchiveEnvironment, ZenodoClient},
//!   metadata::{DepositMetadata, UploadType},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ZenodoClient::new("token", ArchiveEnvironment::Sandbox)?;
//! let metadata = DepositMetadata::new(UploadType::Dataset, "Readings", "<p>Daily</p>");
//!
//! let deposition = client.create_deposit(&metadata).await?;
//! client.upload_file(deposition.id, "data/readings.csv".as_ref()).await?;
//! client.publish_deposit(deposition.id).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{
  header::{CONTENT_LENGTH, CONTENT_TYPE},
  Body, RequestBuilder,
};
use serde::de::DeserializeOwned;
use url::Url;

use super::*;
use crate::metadata::{DepositMetadata, DepositRequest};

/// Which Zenodo instance to talk to. Fixed when a client is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveEnvironment {
  /// zenodo.org
  #[default]
  Production,
  /// sandbox.zenodo.org, for trying things out
  Sandbox,
}

impl ArchiveEnvironment {
  /// Base URL of the REST API.
  pub fn api_base(&self) -> &'static str {
    match self {
      Self::Production => "https://zenodo.org/api",
      Self::Sandbox => "https://sandbox.zenodo.org/api",
    }
  }

  /// Base URL of the web interface, used for deposit links.
  pub fn web_base(&self) -> &'static str {
    match self {
      Self::Production => "https://zenodo.org",
      Self::Sandbox => "https://sandbox.zenodo.org",
    }
  }
}

/// A deposit as reported by the archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deposition {
  /// Archive-assigned id
  pub id:        u64,
  /// `unsubmitted`, `inprogress` or `done`
  #[serde(default)]
  pub state:     Option<String>,
  /// Whether the deposit has been published
  #[serde(default)]
  pub submitted: bool,
  /// DOI, once reserved or minted
  #[serde(default)]
  pub doi:       Option<String>,
  #[allow(missing_docs)]
  #[serde(default)]
  pub links:     DepositionLinks,
  /// Files attached so far
  #[serde(default)]
  pub files:     Vec<DepositFile>,
}

/// Links of a [`Deposition`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositionLinks {
  /// Upload target for file bytes
  #[serde(default)]
  pub bucket:  Option<String>,
  /// Web page of the deposit
  #[serde(default)]
  pub html:    Option<String>,
  #[allow(missing_docs)]
  #[serde(default)]
  pub publish: Option<String>,
}

/// A file attached to a deposit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositFile {
  #[allow(missing_docs)]
  #[serde(default)]
  pub id:       Option<String>,
  /// File name within the deposit
  #[serde(alias = "filename")]
  pub key:      String,
  /// Size in bytes
  #[serde(default, alias = "filesize")]
  pub size:     u64,
  /// Checksum reported by the archive, e.g. `md5:...`
  #[serde(default)]
  pub checksum: Option<String>,
  #[allow(missing_docs)]
  #[serde(default)]
  pub links:    BTreeMap<String, Value>,
}

/// The operations a deposit run needs from an archive.
#[async_trait]
pub trait Archive {
  /// Creates a new deposit.
  async fn create_deposit(&self, metadata: &DepositMetadata) -> Result<Deposition>;

  /// Replaces the metadata of an existing unpublished deposit.
  async fn update_deposit(&self, id: u64, metadata: &DepositMetadata) -> Result<Deposition>;

  /// Fetches a deposit.
  async fn get_deposit(&self, id: u64) -> Result<Deposition>;

  /// Uploads a local file into the deposit's bucket.
  async fn upload_file(&self, id: u64, path: &Path) -> Result<DepositFile>;

  /// Lists the files of a deposit.
  async fn list_files(&self, id: u64) -> Result<Vec<DepositFile>>;

  /// Publishes a deposit. This cannot be undone.
  async fn publish_deposit(&self, id: u64) -> Result<Deposition>;

  /// The URL recorded in the local deposit binding for a deposit.
  fn deposit_url(&self, id: u64) -> String;
}

/// Client for the Zenodo deposition API.
#[derive(Debug, Clone)]
pub struct ZenodoClient {
  /// Internal web client used to connect to the API.
  client:   reqwest::Client,
  /// Access token sent with every request.
  token:    String,
  /// Base URL of the REST API.
  api_base: Url,
  /// Base URL of the web interface.
  web_base: Url,
}

impl ZenodoClient {
  /// Creates a client for one of the public Zenodo instances.
  ///
  /// Fails before any network call when the token is empty.
  pub fn new(token: &str, environment: ArchiveEnvironment) -> Result<Self> {
    Self::with_base_url(token, environment.api_base(), environment.web_base())
  }

  /// Creates a client for an explicit API and web base, e.g. a self-hosted instance.
  pub fn with_base_url(token: &str, api_base: &str, web_base: &str) -> Result<Self> {
    if token.trim().is_empty() {
      return Err(DepositorError::Config(
        "An access token is required to talk to the archive; set ZENODO_TOKEN".to_string(),
      ));
    }
    let client = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self {
      client,
      token: token.trim().to_string(),
      api_base: Url::parse(api_base)?,
      web_base: Url::parse(web_base)?,
    })
  }

  /// URL of an API path below the base.
  fn endpoint(&self, segments: &[&str]) -> Result<Url> { append_segments(&self.api_base, segments) }

  /// Sends a request and decodes a successful JSON response.
  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
    let response = request.query(&[("access_token", &self.token)]).send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
      trace!("Archive error response: {}", String::from_utf8_lossy(&body));
      return Err(DepositorError::Api {
        status: status.as_u16(),
        body:   String::from_utf8_lossy(&body).into_owned(),
      });
    }
    Ok(serde_json::from_slice(&body)?)
  }
}

#[async_trait]
impl Archive for ZenodoClient {
  async fn create_deposit(&self, metadata: &DepositMetadata) -> Result<Deposition> {
    let url = self.endpoint(&["deposit", "depositions"])?;
    debug!("Creating deposit via POST {url}");
    self.send(self.client.post(url).json(&DepositRequest { metadata })).await
  }

  async fn update_deposit(&self, id: u64, metadata: &DepositMetadata) -> Result<Deposition> {
    let url = self.endpoint(&["deposit", "depositions", &id.to_string()])?;
    debug!("Updating deposit {id} via PUT {url}");
    self.send(self.client.put(url).json(&DepositRequest { metadata })).await
  }

  async fn get_deposit(&self, id: u64) -> Result<Deposition> {
    let url = self.endpoint(&["deposit", "depositions", &id.to_string()])?;
    debug!("Fetching deposit {id} via GET {url}");
    self.send(self.client.get(url)).await
  }

  async fn upload_file(&self, id: u64, path: &Path) -> Result<DepositFile> {
    let deposition = self.get_deposit(id).await?;
    let bucket = deposition.links.bucket.ok_or(DepositorError::MissingBucket(id))?;
    let file_name = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .ok_or_else(|| DepositorError::Config(format!("{} is not a file", path.display())))?;
    let url = upload_url(&bucket, &file_name)?;

    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    debug!("Uploading {} ({length} bytes) via PUT {url}", path.display());
    self
      .send(
        self
          .client
          .put(url)
          .header(CONTENT_TYPE, "application/octet-stream")
          .header(CONTENT_LENGTH, length)
          .body(Body::from(file)),
      )
      .await
  }

  async fn list_files(&self, id: u64) -> Result<Vec<DepositFile>> {
    let url = self.endpoint(&["deposit", "depositions", &id.to_string(), "files"])?;
    debug!("Listing files of deposit {id} via GET {url}");
    self.send(self.client.get(url)).await
  }

  async fn publish_deposit(&self, id: u64) -> Result<Deposition> {
    let url =
      self.endpoint(&["deposit", "depositions", &id.to_string(), "actions", "publish"])?;
    debug!("Publishing deposit {id} via POST {url}");
    self.send(self.client.post(url)).await
  }

  fn deposit_url(&self, id: u64) -> String {
    append_segments(&self.web_base, &["deposit", &id.to_string()])
      .map(String::from)
      .unwrap_or_else(|_| format!("{}/deposit/{id}", self.web_base.as_str().trim_end_matches('/')))
  }
}

/// Target URL for a file in a bucket; the file name is percent-encoded as one path segment.
pub fn upload_url(bucket: &str, file_name: &str) -> Result<Url> {
  append_segments(&Url::parse(bucket)?, &[file_name])
}

/// Appends path segments to a base URL, keeping the base's own path.
fn append_segments(base: &Url, segments: &[&str]) -> Result<Url> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| DepositorError::Config(format!("{base} cannot be used as a base URL")))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}
