//! Loading and collecting article contexts.
//!
//! An [`Article`] is everything the deposit run needs from one source document:
//! its frontmatter (with project defaults filled in), the abstract, the DOIs it
//! cites, and where its project configuration lives.
//!
//! A source document is a Markdown file that may start with a YAML frontmatter
//! block:
//!
//! ```markdown
//! ---
//! title: On Deposits
//! authors:
//!   - name: { given: Jane, family: Doe }
//! downloads:
//!   - file: paper.pdf
//! ---
//!
//! # Abstract
//!
//! We deposit things.
//! ```
//!
//! The nearest `project.yml` above the document supplies defaults through its
//! `project:` block and is where the deposit binding is recorded.

use serde_yaml::{Mapping, Value as YamlValue};

use super::*;
use crate::frontmatter::Frontmatter;

/// Name of the project configuration file searched for above each document.
pub const PROJECT_CONFIG_FILE: &str = "project.yml";

/// One source document prepared for depositing.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
  /// Path of the source document
  pub path:          PathBuf,
  /// Frontmatter with project defaults applied
  pub frontmatter:   Frontmatter,
  /// Abstract in Markdown
  pub abstract_text: Option<String>,
  /// DOIs of cited works, keyed by citation key
  pub dois:          BTreeMap<String, String>,
  /// The project configuration file, if one was found
  pub config_file:   Option<PathBuf>,
  /// Directory that download paths are relative to
  pub project:       PathBuf,
}

impl Article {
  /// Loads a document from disk, discovering its project configuration.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let config_file = find_project_config(&directory);
    let defaults = match &config_file {
      Some(config_file) => project_defaults(config_file)?,
      None => Mapping::new(),
    };
    let project = config_file
      .as_ref()
      .and_then(|config_file| config_file.parent().map(Path::to_path_buf))
      .unwrap_or(directory);

    let mut article = Self::parse(path, &source, defaults)?;
    article.config_file = config_file;
    article.project = project;
    Ok(article)
  }

  /// Parses a document's text, filling absent frontmatter keys from `defaults`.
  ///
  /// The result has no configuration file and uses the document's directory as
  /// its project directory.
  pub fn parse(path: impl AsRef<Path>, source: &str, defaults: Mapping) -> Result<Self> {
    let path = path.as_ref();
    let (yaml, body) = split_frontmatter(source);

    let mut document = match yaml {
      Some(yaml) => match serde_yaml::from_str::<YamlValue>(yaml) {
        Ok(YamlValue::Mapping(mapping)) => mapping,
        Ok(YamlValue::Null) => Mapping::new(),
        Ok(_) =>
          return Err(DepositorError::Config(format!(
            "Frontmatter of {} is not a mapping",
            path.display()
          ))),
        Err(source) => return Err(frontmatter_error(path, source)),
      },
      None => Mapping::new(),
    };
    for (key, value) in defaults {
      if !document.contains_key(&key) {
        document.insert(key, value);
      }
    }

    let frontmatter: Frontmatter = serde_yaml::from_value(YamlValue::Mapping(document))
      .map_err(|source| frontmatter_error(path, source))?;

    let abstract_text = frontmatter
      .abstract_text
      .clone()
      .filter(|text| !text.trim().is_empty())
      .or_else(|| extract_abstract(body));

    let mut dois = BTreeMap::new();
    for (key, reference) in &frontmatter.references {
      match reference.doi.as_deref().map(str::trim).filter(|doi| !doi.is_empty()) {
        Some(doi) => {
          dois.insert(key.clone(), doi.to_string());
        },
        None => warn!("Citation \"{key}\" in {} has no DOI; omitting it", path.display()),
      }
    }

    Ok(Self {
      path: path.to_path_buf(),
      frontmatter,
      abstract_text,
      dois,
      config_file: None,
      project: path.parent().map(Path::to_path_buf).unwrap_or_default(),
    })
  }

  /// A human readable name for messages: the title, or the file path.
  pub fn name(&self) -> String {
    self.frontmatter.title.clone().unwrap_or_else(|| self.path.display().to_string())
  }

  /// Numeric first page, `NaN` when missing or not a number.
  pub fn first_page(&self) -> f64 {
    self
      .frontmatter
      .first_page
      .as_deref()
      .and_then(|page| page.trim().parse::<f64>().ok())
      .unwrap_or(f64::NAN)
  }

  /// Local files to upload, resolved against the project directory, in declaration order.
  pub fn download_files(&self) -> Vec<PathBuf> {
    self
      .frontmatter
      .downloads
      .iter()
      .filter_map(|download| match &download.file {
        Some(file) => Some(self.project.join(file)),
        None => {
          debug!("Skipping remote download {:?} of {}", download.url, self.path.display());
          None
        },
      })
      .collect()
  }

  /// The file the deposit binding is read from and written to.
  pub fn binding_file(&self) -> PathBuf {
    self.config_file.clone().unwrap_or_else(|| self.project.join(PROJECT_CONFIG_FILE))
  }
}

/// Collects the articles at `path`: a single document, or every `*.md` below a directory.
///
/// Documents from a directory are returned sorted by path.
pub fn collect_articles(path: impl AsRef<Path>) -> Result<Vec<Article>> {
  let path = path.as_ref();
  let articles = if path.is_dir() {
    let pattern = path.join("**").join("*.md");
    let mut paths: Vec<PathBuf> =
      glob::glob(&pattern.to_string_lossy())?.filter_map(|entry| entry.ok()).collect();
    paths.sort();
    paths.iter().map(Article::load).collect::<Result<Vec<_>>>()?
  } else if path.is_file() {
    vec![Article::load(path)?]
  } else {
    Vec::new()
  };

  if articles.is_empty() {
    return Err(DepositorError::NoArticles(path.display().to_string()));
  }
  debug!("Collected {} article(s) from {}", articles.len(), path.display());
  Ok(articles)
}

/// Splits a document into its YAML frontmatter (if any) and its body.
pub fn split_frontmatter(source: &str) -> (Option<&str>, &str) {
  let source = source.strip_prefix('\u{feff}').unwrap_or(source);
  let Some(rest) = source.strip_prefix("---") else {
    return (None, source);
  };
  let Some(rest) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) else {
    return (None, source);
  };

  let mut offset = 0;
  for line in rest.split_inclusive('\n') {
    let trimmed = line.trim_end();
    if trimmed == "---" || trimmed == "..." {
      return (Some(&rest[..offset]), &rest[offset + line.len()..]);
    }
    offset += line.len();
  }
  (None, source)
}

/// Extracts the body section under an `Abstract` heading, up to the next heading of the
/// same or higher level.
pub fn extract_abstract(body: &str) -> Option<String> {
  lazy_static! {
    static ref HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap();
  }

  let mut level = None;
  let mut in_fence = false;
  let mut lines = Vec::new();
  for line in body.lines() {
    if line.trim_start().starts_with("```") {
      in_fence = !in_fence;
    }
    let heading = (!in_fence).then(|| HEADING.captures(line)).flatten();

    match (level, heading) {
      (None, Some(captures)) if captures[2].eq_ignore_ascii_case("abstract") =>
        level = Some(captures[1].len()),
      (Some(current), Some(captures)) if captures[1].len() <= current => break,
      (Some(_), _) => lines.push(line),
      (None, _) => {},
    }
  }

  let text = lines.join("\n").trim().to_string();
  (!text.is_empty()).then_some(text)
}

/// Finds the nearest project configuration at or above `directory`.
pub fn find_project_config(directory: &Path) -> Option<PathBuf> {
  directory
    .ancestors()
    .map(|ancestor| ancestor.join(PROJECT_CONFIG_FILE))
    .find(|candidate| candidate.is_file())
}

/// Reads the `project:` block of a configuration file as frontmatter defaults.
fn project_defaults(config_file: &Path) -> Result<Mapping> {
  let content = std::fs::read_to_string(config_file)?;
  let value: YamlValue =
    serde_yaml::from_str(&content).map_err(|source| frontmatter_error(config_file, source))?;
  match value.get("project") {
    Some(YamlValue::Mapping(project)) => Ok(project.clone()),
    _ => Ok(Mapping::new()),
  }
}

/// Wraps a YAML error with the document it came from.
fn frontmatter_error(path: &Path, source: serde_yaml::Error) -> DepositorError {
  DepositorError::Frontmatter { path: path.display().to_string(), source }
}
