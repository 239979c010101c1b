//! User configuration and access token lookup.
//!
//! The access token is only ever read from the `ZENODO_TOKEN` environment
//! variable. Everything else can be given defaults in
//! `<config dir>/depositor/config.toml`:
//!
//! ```toml
//! sandbox = true
//! upload_type = "presentation"
//! publish = false
//! communities = ["my-conference"]
//! ```

use super::*;
use crate::{client::ArchiveEnvironment, metadata::UploadType};

/// Environment variable holding the archive access token.
pub const TOKEN_ENV: &str = "ZENODO_TOKEN";

/// Reads the access token from the environment, failing when it is unset or blank.
pub fn access_token() -> Result<String> {
  match std::env::var(TOKEN_ENV) {
    Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
    _ => Err(DepositorError::Config(format!(
      "No access token found; set the {TOKEN_ENV} environment variable"
    ))),
  }
}

/// Defaults for a deposit run. Command line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Use the sandbox instance instead of production.
  pub sandbox:     bool,
  /// Upload type used when none is given.
  pub upload_type: Option<UploadType>,
  /// Publish deposits after uploading their files.
  pub publish:     bool,
  /// Communities every deposit is submitted to.
  pub communities: Vec<String>,
  /// Overrides the API base URL, e.g. for a self-hosted instance.
  pub api_url:     Option<String>,
  /// Overrides the web base URL used for deposit links.
  pub web_url:     Option<String>,
}

impl Config {
  /// `<config dir>/depositor/config.toml`, if the platform has a config directory.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("depositor").join("config.toml"))
  }

  /// Loads a configuration file. A missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.is_file() {
      debug!("No configuration at {}, using defaults", path.display());
      return Ok(Self::default());
    }
    let config = toml::from_str(&std::fs::read_to_string(path)?)?;
    debug!("Loaded configuration from {}: {config:?}", path.display());
    Ok(config)
  }

  /// The archive instance selected by this configuration.
  pub fn environment(&self) -> ArchiveEnvironment {
    if self.sandbox {
      ArchiveEnvironment::Sandbox
    } else {
      ArchiveEnvironment::Production
    }
  }

  /// API and web base URLs, honouring overrides.
  pub fn base_urls(&self) -> (String, String) {
    let environment = self.environment();
    (
      self.api_url.clone().unwrap_or_else(|| environment.api_base().to_string()),
      self.web_url.clone().unwrap_or_else(|| environment.web_base().to_string()),
    )
  }
}
