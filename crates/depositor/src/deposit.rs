//! The sequential deposit run.
//!
//! A [`Depositor`] takes the articles of one issue through the same stages, one
//! article at a time and one awaited call at a time:
//!
//! 1. [`DepositStage::Built`]: the deposit record is built from the article
//! 2. [`DepositStage::Submitted`]: the deposit is created, or updated when a binding exists
//! 3. [`DepositStage::FilesUploaded`]: each declared file is uploaded, with one retry
//! 4. [`DepositStage::Bound`]: the binding and the remote deposit agree
//! 5. [`DepositStage::Published`]: only when publishing was requested
//!
//! A newly created deposit is bound before its first upload, so a crash
//! mid-run leads to an update instead of a duplicate on the next run. Calls are
//! never issued concurrently: the create-or-update decision is a read and then
//! a write of the binding file.

use super::*;
use crate::{
  article::Article,
  binding::{read_binding, write_binding},
  builder::build_deposit,
  client::{Archive, DepositFile, Deposition},
  metadata::{Community, DepositMetadata, UploadType},
  reconcile::{reconcile, IssueData},
};

/// Stages an article passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DepositStage {
  /// The deposit record has been built
  Built,
  /// The record has been created or updated remotely
  Submitted,
  /// Every declared file has been uploaded
  FilesUploaded,
  /// The local binding points at the deposit
  Bound,
  /// The deposit has been published
  Published,
}

impl Display for DepositStage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let stage = match self {
      Self::Built => "built",
      Self::Submitted => "submitted",
      Self::FilesUploaded => "files uploaded",
      Self::Bound => "bound",
      Self::Published => "published",
    };
    write!(f, "{stage}")
  }
}

/// What a run did for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositOutcome {
  /// Title of the article
  pub title:      String,
  /// Id of the deposit the article went to
  pub deposit_id: u64,
  /// Web link of the deposit
  pub url:        String,
  /// Whether the deposit was created by this run rather than updated
  pub created:    bool,
  /// Files uploaded, in upload order
  pub files:      Vec<DepositFile>,
  /// The published deposit, when publishing was requested
  pub published:  Option<Deposition>,
}

/// Runs deposits against an [`Archive`].
#[derive(Debug)]
pub struct Depositor<A: Archive> {
  /// Where deposits go.
  archive:     A,
  /// Upload type of every deposit in the run.
  upload_type: UploadType,
  /// Publish each deposit after its files are uploaded.
  publish:     bool,
  /// Communities added to every deposit.
  communities: Vec<Community>,
}

impl<A: Archive + Sync> Depositor<A> {
  /// Creates a depositor that leaves deposits unpublished.
  pub fn new(archive: A, upload_type: UploadType) -> Self {
    Self { archive, upload_type, publish: false, communities: Vec::new() }
  }

  /// Publishes each deposit once its files are uploaded.
  pub fn with_publish(mut self, publish: bool) -> Self {
    self.publish = publish;
    self
  }

  /// Submits every deposit to the given communities.
  pub fn with_communities<I, S>(mut self, communities: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>, {
    self.communities =
      communities.into_iter().map(|identifier| Community { identifier: identifier.into() }).collect();
    self
  }

  /// The archive deposits go to.
  pub fn archive(&self) -> &A { &self.archive }

  /// Deposits every article of an issue, in ascending first page order.
  ///
  /// Issue-level fields are reconciled across all articles before the first
  /// remote call. Any failure aborts the remaining work; articles finished
  /// before the failure stay deposited.
  pub async fn run(&self, mut articles: Vec<Article>) -> Result<Vec<DepositOutcome>> {
    if articles.is_empty() {
      return Err(DepositorError::NoArticles("the given input".to_string()));
    }
    let issue = reconcile(articles.iter().map(|article| &article.frontmatter))?;
    sort_articles(&mut articles);

    let mut outcomes = Vec::with_capacity(articles.len());
    for article in &articles {
      let metadata = self.build(article, &issue)?;
      outcomes.push(self.deposit(article, &metadata).await?);
    }
    Ok(outcomes)
  }

  /// Builds the record of one article with the run's communities.
  fn build(&self, article: &Article, issue: &IssueData) -> Result<DepositMetadata> {
    let mut metadata = build_deposit(article, self.upload_type, issue)?;
    metadata.communities.extend(self.communities.iter().cloned());
    debug!("{}: {}", article.name(), DepositStage::Built);
    Ok(metadata)
  }

  /// Submits, uploads, binds and optionally publishes one article.
  async fn deposit(&self, article: &Article, metadata: &DepositMetadata) -> Result<DepositOutcome> {
    let binding_file = article.binding_file();
    let (deposition, created) = match read_binding(&binding_file)? {
      Some(id) => {
        info!("Updating deposit {id} for \"{}\"", article.name());
        (self.archive.update_deposit(id, metadata).await?, false)
      },
      None => {
        info!("Creating a new deposit for \"{}\"", article.name());
        let deposition = self.archive.create_deposit(metadata).await?;
        let url = self.archive.deposit_url(deposition.id);
        if !write_binding(&binding_file, &url)? {
          return Err(DepositorError::InvalidBinding(format!(
            "created deposit {url} but {} already names another deposit",
            binding_file.display()
          )));
        }
        (deposition, true)
      },
    };
    debug!("{}: {} as deposit {}", article.name(), DepositStage::Submitted, deposition.id);

    let mut files = Vec::new();
    for path in article.download_files() {
      files.push(self.upload_with_retry(deposition.id, &path).await?);
    }
    debug!("{}: {} ({} file(s))", article.name(), DepositStage::FilesUploaded, files.len());
    debug!("{}: {} to {}", article.name(), DepositStage::Bound, binding_file.display());

    let published = if self.publish {
      let published = self.archive.publish_deposit(deposition.id).await?;
      info!("Published deposit {} for \"{}\"", deposition.id, article.name());
      Some(published)
    } else {
      None
    };

    Ok(DepositOutcome {
      title: metadata.title.clone(),
      deposit_id: deposition.id,
      url: self.archive.deposit_url(deposition.id),
      created,
      files,
      published,
    })
  }

  /// Uploads a file, retrying once after a failure.
  async fn upload_with_retry(&self, id: u64, path: &Path) -> Result<DepositFile> {
    match self.archive.upload_file(id, path).await {
      Ok(file) => Ok(file),
      Err(error) => {
        warn!("Upload of {} failed, retrying once: {error}", path.display());
        self.archive.upload_file(id, path).await.map_err(|source| DepositorError::Upload {
          file:   path.display().to_string(),
          source: Box::new(source),
        })
      },
    }
  }
}

/// Sorts articles by ascending first page. Articles without a numeric first page go last,
/// keeping their relative order.
pub fn sort_articles(articles: &mut [Article]) {
  articles.sort_by(|a, b| {
    let (a, b) = (a.first_page(), b.first_page());
    a.is_nan().cmp(&b.is_nan()).then_with(|| a.total_cmp(&b))
  });
}

#[cfg(test)]
mod tests {
  use std::{fs, sync::Mutex};

  use serde_yaml::Mapping;

  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  enum Call {
    Create(String),
    Update(u64, String),
    Upload(u64, String),
    Publish(u64),
  }

  /// Records calls and fails uploads on request.
  #[derive(Debug, Default)]
  struct FakeArchive {
    calls:           Mutex<Vec<Call>>,
    upload_failures: Mutex<usize>,
    binding_seen:    Mutex<Vec<Option<u64>>>,
    binding_file:    Option<PathBuf>,
    submitted:       Mutex<Vec<DepositMetadata>>,
    bind_on_create:  Option<PathBuf>,
  }

  impl FakeArchive {
    fn failing_uploads(count: usize) -> Self {
      Self { upload_failures: Mutex::new(count), ..Default::default() }
    }

    fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }
  }

  #[async_trait]
  impl Archive for FakeArchive {
    async fn create_deposit(&self, metadata: &DepositMetadata) -> Result<Deposition> {
      self.calls.lock().unwrap().push(Call::Create(metadata.title.clone()));
      self.submitted.lock().unwrap().push(metadata.clone());
      if let Some(path) = &self.bind_on_create {
        fs::write(path, "project:\n  zenodo: https://zenodo.test/deposit/99\n")?;
      }
      Ok(Deposition { id: 7, ..Default::default() })
    }

    async fn update_deposit(&self, id: u64, metadata: &DepositMetadata) -> Result<Deposition> {
      self.calls.lock().unwrap().push(Call::Update(id, metadata.title.clone()));
      self.submitted.lock().unwrap().push(metadata.clone());
      Ok(Deposition { id, ..Default::default() })
    }

    async fn get_deposit(&self, id: u64) -> Result<Deposition> {
      Ok(Deposition { id, ..Default::default() })
    }

    async fn upload_file(&self, id: u64, path: &Path) -> Result<DepositFile> {
      if let Some(binding_file) = &self.binding_file {
        self.binding_seen.lock().unwrap().push(read_binding(binding_file)?);
      }
      let name = path.file_name().unwrap().to_string_lossy().into_owned();
      self.calls.lock().unwrap().push(Call::Upload(id, name.clone()));
      let mut failures = self.upload_failures.lock().unwrap();
      if *failures > 0 {
        *failures -= 1;
        return Err(DepositorError::Api { status: 500, body: "boom".into() });
      }
      Ok(DepositFile { key: name, ..Default::default() })
    }

    async fn list_files(&self, _id: u64) -> Result<Vec<DepositFile>> { Ok(Vec::new()) }

    async fn publish_deposit(&self, id: u64) -> Result<Deposition> {
      self.calls.lock().unwrap().push(Call::Publish(id));
      Ok(Deposition { id, submitted: true, ..Default::default() })
    }

    fn deposit_url(&self, id: u64) -> String { format!("https://zenodo.test/deposit/{id}") }
  }

  /// Writes an article and its download into `dir` and loads it.
  fn article(dir: &Path, name: &str, title: &str, first_page: Option<u32>) -> Article {
    fs::write(dir.join(format!("{name}.pdf")), "%PDF").unwrap();
    let first_page = first_page.map(|page| format!("first_page: {page}\n")).unwrap_or_default();
    let source = format!(
      "---\ntitle: {title}\nabstract: About {title}\nvenue: {{ title: Proc X }}\n{first_page}\
       downloads:\n  - file: {name}.pdf\n---\n"
    );
    let path = dir.join(format!("{name}.md"));
    fs::write(&path, &source).unwrap();
    Article::load(&path).unwrap()
  }

  #[tokio::test]
  async fn test_create_binds_before_first_upload() {
    let dir = tempdir().unwrap();
    let binding_file = dir.path().join("project.yml");
    fs::write(&binding_file, "project:\n  title: Proceedings\n").unwrap();
    let articles = vec![article(dir.path(), "a", "Alpha", Some(1))];

    let archive = FakeArchive { binding_file: Some(binding_file.clone()), ..Default::default() };
    let depositor = Depositor::new(archive, UploadType::Presentation);
    let outcomes = depositor.run(articles).await.unwrap();

    assert_eq!(depositor.archive().calls(), [
      Call::Create("Alpha".into()),
      Call::Upload(7, "a.pdf".into())
    ]);
    assert_eq!(*depositor.archive().binding_seen.lock().unwrap(), [Some(7)]);
    assert_eq!(read_binding(&binding_file).unwrap(), Some(7));
    assert!(outcomes[0].created);
    assert_eq!(outcomes[0].files[0].key, "a.pdf");
    assert_eq!(outcomes[0].published, None);
  }

  #[tokio::test]
  async fn test_unrecorded_create_aborts_before_upload() {
    let dir = tempdir().unwrap();
    let binding_file = dir.path().join("project.yml");
    let articles = vec![article(dir.path(), "a", "Alpha", None)];

    let archive = FakeArchive { bind_on_create: Some(binding_file.clone()), ..Default::default() };
    let depositor = Depositor::new(archive, UploadType::Presentation);
    let result = depositor.run(articles).await;

    assert!(matches!(result, Err(DepositorError::InvalidBinding(_))));
    assert_eq!(depositor.archive().calls(), [Call::Create("Alpha".into())]);
    assert_eq!(read_binding(&binding_file).unwrap(), Some(99));
  }

  #[tokio::test]
  #[traced_test]
  async fn test_existing_binding_updates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("project.yml"), "project:\n  zenodo: https://zenodo.test/deposit/42\n")
      .unwrap();
    let articles = vec![article(dir.path(), "a", "Alpha", None)];

    let depositor = Depositor::new(FakeArchive::default(), UploadType::Presentation);
    let outcomes = depositor.run(articles).await.unwrap();

    let calls = depositor.archive().calls();
    assert_eq!(calls[0], Call::Update(42, "Alpha".into()));
    assert!(!calls.iter().any(|call| matches!(call, Call::Create(_))));
    assert!(!outcomes[0].created);
    assert!(logs_contain("Updating deposit 42"));
  }

  #[tokio::test]
  #[traced_test]
  async fn test_upload_retried_once() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.pdf"), "%PDF").unwrap();
    fs::write(dir.path().join("b.pdf"), "%PDF").unwrap();
    let path = dir.path().join("a.md");
    fs::write(
      &path,
      "---\ntitle: Alpha\nabstract: About Alpha\ndownloads:\n  - file: a.pdf\n  - file: \
       b.pdf\n---\n",
    )
    .unwrap();
    let articles = vec![Article::load(&path).unwrap()];

    let depositor = Depositor::new(FakeArchive::failing_uploads(1), UploadType::Dataset);
    let outcomes = depositor.run(articles).await.unwrap();

    assert_eq!(depositor.archive().calls(), [
      Call::Create("Alpha".into()),
      Call::Upload(7, "a.pdf".into()),
      Call::Upload(7, "a.pdf".into()),
      Call::Upload(7, "b.pdf".into())
    ]);
    let keys: Vec<&str> = outcomes[0].files.iter().map(|file| file.key.as_str()).collect();
    assert_eq!(keys, ["a.pdf", "b.pdf"]);
    assert!(logs_contain("retrying once"));
  }

  #[tokio::test]
  async fn test_second_upload_failure_aborts_run() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();
    let articles =
      vec![article(&first, "a", "Alpha", Some(1)), article(&second, "b", "Beta", Some(2))];

    let depositor = Depositor::new(FakeArchive::failing_uploads(2), UploadType::Dataset);
    let result = depositor.run(articles).await;

    assert!(matches!(result, Err(DepositorError::Upload { .. })));
    assert_eq!(depositor.archive().calls().len(), 3);
    assert!(!depositor.archive().calls().contains(&Call::Create("Beta".into())));
  }

  #[tokio::test]
  async fn test_articles_processed_by_first_page() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();
    let articles =
      vec![article(&first, "a", "Page Two", Some(2)), article(&second, "b", "Page One", Some(1))];

    let depositor = Depositor::new(FakeArchive::default(), UploadType::Presentation);
    let outcomes = depositor.run(articles).await.unwrap();

    let titles: Vec<&str> = outcomes.iter().map(|outcome| outcome.title.as_str()).collect();
    assert_eq!(titles, ["Page One", "Page Two"]);
  }

  #[tokio::test]
  async fn test_conflict_aborts_before_any_call() {
    let dir = tempdir().unwrap();
    let a = Article::parse(
      dir.path().join("a.md"),
      "---\ntitle: A\nabstract: A\nvenue: { title: Proc X }\n---\n",
      Mapping::new(),
    )
    .unwrap();
    let b = Article::parse(
      dir.path().join("b.md"),
      "---\ntitle: B\nabstract: B\nvenue: { title: Proc Y }\n---\n",
      Mapping::new(),
    )
    .unwrap();

    let depositor = Depositor::new(FakeArchive::default(), UploadType::Presentation);
    let result = depositor.run(vec![a, b]).await;

    assert!(matches!(result, Err(DepositorError::Conflict { field: "venue.title", .. })));
    assert!(depositor.archive().calls().is_empty());
  }

  #[tokio::test]
  async fn test_publish_and_communities() {
    let dir = tempdir().unwrap();
    let articles = vec![article(dir.path(), "a", "Alpha", None)];

    let depositor = Depositor::new(FakeArchive::default(), UploadType::Presentation)
      .with_publish(true)
      .with_communities(["conf"]);
    let outcomes = depositor.run(articles).await.unwrap();

    assert_eq!(depositor.archive().calls().last(), Some(&Call::Publish(7)));
    assert!(outcomes[0].published.as_ref().is_some_and(|published| published.submitted));
    let submitted = depositor.archive().submitted.lock().unwrap();
    assert_eq!(submitted[0].communities, [Community { identifier: "conf".into() }]);
    let json = serde_json::to_value(&submitted[0]).unwrap();
    assert_eq!(json["communities"], serde_json::json!([{ "identifier": "conf" }]));
  }

  #[tokio::test]
  async fn test_empty_run() {
    let depositor = Depositor::new(FakeArchive::default(), UploadType::Presentation);
    assert!(matches!(depositor.run(Vec::new()).await, Err(DepositorError::NoArticles(_))));
  }

  #[test]
  fn test_sort_puts_missing_pages_last() {
    let dir = tempdir().unwrap();
    let parse = |name: &str, page: &str| {
      Article::parse(
        dir.path().join(name),
        &format!("---\ntitle: {name}\nfirst_page: {page}\n---\n"),
        Mapping::new(),
      )
      .unwrap()
    };
    let mut articles =
      vec![parse("x", "xii"), parse("c", "10"), parse("a", "2"), parse("y", "~"), parse("b", "3")];
    sort_articles(&mut articles);

    let names: Vec<String> = articles.iter().map(Article::name).collect();
    assert_eq!(names, ["a", "b", "c", "x", "y"]);
  }
}
