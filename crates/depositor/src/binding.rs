//! The local deposit binding.
//!
//! Once a deposit exists for an article, its URL is written into the
//! `project:` block of the article's project configuration:
//!
//! ```yaml
//! project:
//!   zenodo: https://zenodo.org/deposit/1234
//!   title: My Proceedings
//! ```
//!
//! Later runs read the trailing id back and update that deposit instead of
//! creating another one. The configuration is edited as text so existing
//! comments and key order survive.

use serde_yaml::Value as YamlValue;

use super::*;

/// Key of the deposit binding inside the `project:` block.
pub const BINDING_KEY: &str = "zenodo";

/// Reads the bound deposit id from a configuration file. A missing file has no binding.
pub fn read_binding(path: &Path) -> Result<Option<u64>> {
  if !path.is_file() {
    return Ok(None);
  }
  parse_binding(&std::fs::read_to_string(path)?)
}

/// Reads the bound deposit id from configuration text.
pub fn parse_binding(content: &str) -> Result<Option<u64>> {
  project_binding(&parse_document(content)?)
}

/// Parses configuration text. A file holding only blank lines and comments is an empty document.
fn parse_document(content: &str) -> Result<YamlValue> {
  let empty = content.lines().map(str::trim).all(|line| line.is_empty() || line.starts_with('#'));
  if empty {
    return Ok(YamlValue::Null);
  }
  Ok(serde_yaml::from_str(content)?)
}

fn project_binding(document: &YamlValue) -> Result<Option<u64>> {
  let binding = match document.get("project").and_then(|project| project.get(BINDING_KEY)) {
    None | Some(YamlValue::Null) => return Ok(None),
    Some(YamlValue::String(url)) => url.clone(),
    Some(YamlValue::Number(number)) => number.to_string(),
    Some(other) => return Err(DepositorError::InvalidBinding(format!("{other:?}"))),
  };
  deposit_id(&binding).map(Some)
}

/// The deposit id at the end of a binding URL.
pub fn deposit_id(binding: &str) -> Result<u64> {
  lazy_static! {
    static ref TRAILING_ID: Regex = Regex::new(r"(\d+)/*$").unwrap();
  }

  TRAILING_ID
    .captures(binding.trim())
    .and_then(|captures| captures[1].parse().ok())
    .ok_or_else(|| DepositorError::InvalidBinding(binding.to_string()))
}

/// Records a deposit URL in a configuration file, creating the file when needed.
///
/// Returns `false` when the file already carries a binding, which is left untouched.
pub fn write_binding(path: &Path, url: &str) -> Result<bool> {
  let content = if path.is_file() { std::fs::read_to_string(path)? } else { String::new() };
  match insert_binding(&content, url)? {
    Some(updated) => {
      if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(path, updated)?;
      info!("Recorded deposit {url} in {}", path.display());
      Ok(true)
    },
    None => {
      debug!("{} already has a deposit binding", path.display());
      Ok(false)
    },
  }
}

/// Inserts the binding line directly below `project:`.
///
/// An empty `zenodo:` entry of the block is filled in where it stands. Otherwise
/// the line takes the indentation of the block's first entry, and keys nested
/// deeper than that are not bindings. A configuration without a `project:` key
/// gets a block appended. Returns `None` when a binding is already present.
///
/// A `project` value that is not a block mapping, such as `project: { title: P }`,
/// cannot be edited line by line and is an error.
pub fn insert_binding(content: &str, url: &str) -> Result<Option<String>> {
  lazy_static! {
    static ref PROJECT: Regex = Regex::new(r"(?m)^project:[ \t]*(#.*)?\r?$").unwrap();
    static ref EMPTY_BINDING: Regex =
      Regex::new(r"^zenodo:[ \t]*(~|null|Null|NULL)?[ \t]*(#.*)?\r?$").unwrap();
  }

  let document = parse_document(content)?;
  if project_binding(&document)?.is_some() {
    return Ok(None);
  }

  let Some(project) = PROJECT.find(content) else {
    let appendable = matches!(document, YamlValue::Mapping(_) | YamlValue::Null);
    if !appendable || document.get("project").is_some() {
      return Err(DepositorError::InvalidBinding(format!(
        "cannot add `{BINDING_KEY}: {url}` to a configuration without a `project:` block"
      )));
    }
    let separator = if content.is_empty() || content.ends_with('\n') { "" } else { "\n" };
    return Ok(Some(format!("{content}{separator}project:\n  {BINDING_KEY}: {url}\n")));
  };

  let block_start = (project.end() + 1).min(content.len());
  let mut block = Vec::new();
  let mut offset = block_start;
  for line in content[block_start..].split_inclusive('\n') {
    if !(line.trim().is_empty() || line.starts_with([' ', '\t'])) {
      break;
    }
    block.push((offset, line));
    offset += line.len();
  }
  let indent = block
    .iter()
    .map(|(_, line)| *line)
    .find(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
    .map(|line| &line[..line.len() - line.trim_start().len()])
    .unwrap_or("  ");

  let empty = block.iter().find(|(_, line)| {
    let rest = line.strip_prefix(indent).unwrap_or_default();
    EMPTY_BINDING.is_match(rest.trim_end_matches('\n'))
  });
  if let Some((start, line)) = empty {
    let end = start + line.trim_end_matches(['\r', '\n']).len();
    let (head, tail) = (&content[..*start], &content[end..]);
    return Ok(Some(format!("{head}{indent}{BINDING_KEY}: {url}{tail}")));
  }

  let head = &content[..project.end()];
  let tail = &content[project.end()..];
  let tail = tail.strip_prefix('\n').unwrap_or(tail);
  Ok(Some(format!("{head}\n{indent}{BINDING_KEY}: {url}\n{tail}")))
}
