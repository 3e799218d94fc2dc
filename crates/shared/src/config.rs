//! Configuration file for biblio
//!
//! The file is YAML with three sections:
//!
//! ```yaml
//! directories:
//!   AbstractRetrieval: /home/me/.cache/biblio/Scopus/abstract_retrieval
//! authentication:
//!   api_keys: [key1, key2]
//!   inst_tokens: [token1]
//! requests:
//!   timeout: 20
//!   retries: 5
//! ```

use crate::api::Api;
use crate::error::{BiblioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// API keys and the InstTokens paired with them by position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(default)]
    pub api_keys: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inst_tokens: Vec<String>,
}

/// HTTP request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Retries on server errors
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds to back off, doubled with every retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Proxy URL for all requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

fn default_timeout() -> u64 {
    20
}

fn default_retries() -> u32 {
    5
}

fn default_backoff_factor() -> f64 {
    2.0
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retries: default_retries(),
            backoff_factor: default_backoff_factor(),
            proxy: None,
        }
    }
}

/// On-disk layout; sections are optional so that their absence can be reported
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    directories: Option<BTreeMap<String, PathBuf>>,
    authentication: Option<Authentication>,
    requests: Option<RequestSettings>,
}

/// Options for [`Config::init`]
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Location of the configuration file; defaults to [`default_config_path`]
    pub config_path: Option<PathBuf>,

    /// API keys overriding those in the file
    pub keys: Option<Vec<String>>,

    /// InstTokens overriding those in the file
    pub inst_tokens: Option<Vec<String>>,
}

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    directories: BTreeMap<String, PathBuf>,
    authentication: Authentication,
    requests: RequestSettings,
    custom_keys: Option<Vec<String>>,
    custom_inst_tokens: Option<Vec<String>>,
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("biblio")
        .join("config.yaml")
}

fn default_directories() -> BTreeMap<String, PathBuf> {
    Api::ALL
        .iter()
        .map(|api| (api.name().to_string(), api.default_dir()))
        .collect()
}

fn write_file(path: &Path, file: &ConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_yaml::to_string(file)?)?;
    Ok(())
}

impl Config {
    /// Load the configuration file, creating it first if it does not exist.
    ///
    /// Fills in missing cache directories, creates the cache folders and
    /// validates the credentials.
    pub fn init(options: InitOptions) -> Result<Self> {
        let path = options.config_path.unwrap_or_else(default_config_path);

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::create(
                &path,
                options.keys.as_deref().unwrap_or_default(),
                options.inst_tokens.as_deref().unwrap_or_default(),
            )?
        };

        config.custom_keys = options.keys.filter(|k| !k.is_empty());
        config.custom_inst_tokens = options.inst_tokens.filter(|t| !t.is_empty());

        config.create_cache_folders()?;
        config.check_keys_tokens()?;
        Ok(config)
    }

    /// Write a fresh configuration file with default directories
    pub fn create(path: &Path, keys: &[String], inst_tokens: &[String]) -> Result<Self> {
        tracing::info!("Creating config file at {}", path.display());

        let file = ConfigFile {
            directories: Some(default_directories()),
            authentication: Some(Authentication {
                api_keys: keys.to_vec(),
                inst_tokens: inst_tokens.to_vec(),
            }),
            requests: Some(RequestSettings::default()),
        };
        write_file(path, &file)?;

        Ok(Self {
            path: path.to_path_buf(),
            directories: default_directories(),
            authentication: file.authentication.unwrap_or_default(),
            requests: RequestSettings::default(),
            custom_keys: None,
            custom_inst_tokens: None,
        })
    }

    /// Read an existing configuration file.
    ///
    /// Every section must be present. Directories missing for an API are
    /// filled with defaults and written back.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut file: ConfigFile = serde_yaml::from_str(&content)?;

        let directories = file
            .directories
            .clone()
            .ok_or_else(|| BiblioError::MissingSection("directories".to_string()))?;
        let authentication = file
            .authentication
            .clone()
            .ok_or_else(|| BiblioError::MissingSection("authentication".to_string()))?;
        let requests = file
            .requests
            .clone()
            .ok_or_else(|| BiblioError::MissingSection("requests".to_string()))?;

        let mut config = Self {
            path: path.to_path_buf(),
            directories,
            authentication,
            requests,
            custom_keys: None,
            custom_inst_tokens: None,
        };

        if config.fill_default_directories() {
            tracing::debug!("Adding default cache directories to {}", path.display());
            file.directories = Some(config.directories.clone());
            write_file(path, &file)?;
        }

        Ok(config)
    }

    /// Configuration rooted at `cache_root`, never written to disk
    pub fn with_cache_root(cache_root: &Path, keys: Vec<String>) -> Self {
        let directories = Api::ALL
            .iter()
            .map(|api| {
                let dir = cache_root
                    .join(api.database().as_str())
                    .join(api.snake_name());
                (api.name().to_string(), dir)
            })
            .collect();

        Self {
            path: cache_root.join("config.yaml"),
            directories,
            authentication: Authentication {
                api_keys: keys,
                inst_tokens: Vec::new(),
            },
            requests: RequestSettings::default(),
            custom_keys: None,
            custom_inst_tokens: None,
        }
    }

    fn fill_default_directories(&mut self) -> bool {
        let mut modified = false;
        for api in Api::ALL {
            if !self.directories.contains_key(api.name()) {
                self.directories
                    .insert(api.name().to_string(), api.default_dir());
                modified = true;
            }
        }
        modified
    }

    /// Create `<dir>/<VIEW>` for every view of every configured API
    pub fn create_cache_folders(&self) -> Result<()> {
        for (name, dir) in &self.directories {
            let Some(api) = Api::from_name(name) else {
                continue;
            };
            for view in api.views() {
                std::fs::create_dir_all(dir.join(view.as_str()))?;
            }
        }
        Ok(())
    }

    /// Fail unless the credentials are usable
    pub fn check_keys_tokens(&self) -> Result<()> {
        let keys = self.keys();
        let tokens = self.inst_tokens();

        if keys.is_empty() && tokens.is_empty() {
            return Err(BiblioError::Credentials(
                "No API keys or InstTokens found. Please provide at least one API key or InstToken"
                    .to_string(),
            ));
        }
        if keys.is_empty() {
            return Err(BiblioError::Credentials(
                "InstTokens found but not corresponding API keys. Please provide the API keys \
                 that correspond to the InstTokens"
                    .to_string(),
            ));
        }
        if keys.len() < tokens.len() {
            return Err(BiblioError::Credentials(
                "More InstTokens than API keys found, or lists are misaligned. Please provide \
                 all the API keys that correspond to the InstTokens"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// API keys in effect; custom keys take precedence over the file
    pub fn keys(&self) -> Vec<String> {
        match &self.custom_keys {
            Some(keys) => keys.clone(),
            None => clean(&self.authentication.api_keys),
        }
    }

    /// InstTokens in effect.
    ///
    /// Tokens from the file are ignored when custom keys are set, since
    /// they would be paired with the wrong keys.
    pub fn inst_tokens(&self) -> Vec<String> {
        match (&self.custom_inst_tokens, &self.custom_keys) {
            (Some(tokens), _) => tokens.clone(),
            (None, Some(_)) => Vec::new(),
            (None, None) => clean(&self.authentication.inst_tokens),
        }
    }

    /// Replace the keys in effect
    pub fn set_custom_keys(&mut self, keys: Vec<String>, inst_tokens: Vec<String>) {
        self.custom_keys = Some(keys).filter(|k| !k.is_empty());
        self.custom_inst_tokens = Some(inst_tokens).filter(|t| !t.is_empty());
    }

    /// Cache directory of an API
    pub fn directory(&self, api: Api) -> PathBuf {
        self.directories
            .get(api.name())
            .cloned()
            .unwrap_or_else(|| api.default_dir())
    }

    pub fn directories(&self) -> &BTreeMap<String, PathBuf> {
        &self.directories
    }

    pub fn requests(&self) -> &RequestSettings {
        &self.requests
    }

    pub fn requests_mut(&mut self) -> &mut RequestSettings {
        &mut self.requests
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
