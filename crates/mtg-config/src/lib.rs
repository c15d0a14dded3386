//! Configuration management for mtgdocs.
//!
//! Parses `mtgdocs.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `api.base_url`
//! - `api.token`
//! - `session.user_id`

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the current user id.
    pub user_id: Option<String>,
    /// Override the API base URL.
    pub api_url: Option<String>,
    /// Override the graph size preset.
    pub graph_size: Option<GraphSize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mtgdocs.toml";

/// Default group colours, cycled by group index.
const DEFAULT_PALETTE: [&str; 8] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#14b8a6", "#64748b",
];

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document service API configuration (optional section).
    pub api: Option<ApiConfig>,
    /// Session configuration (paths are relative strings from TOML).
    session: SessionConfigRaw,
    /// Rendering configuration.
    pub render: RenderConfig,

    /// Resolved session configuration (set after loading).
    #[serde(skip)]
    pub session_resolved: SessionConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Document service API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API base URL (e.g., `https://docs.example.com/api`).
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "api.base_url")?;
        require_http_url(&self.base_url, "api.base_url")?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Raw session configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SessionConfigRaw {
    user_id: Option<String>,
    images_manifest: Option<String>,
}

/// Resolved session configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SessionConfig {
    /// Id of the user the documents are rendered for.
    pub user_id: Option<String>,
    /// JSON file listing the user's own images.
    pub images_manifest: Option<PathBuf>,
}

/// Graph image size preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphSize {
    /// 320px wide.
    #[default]
    Small,
    /// 480px wide.
    Medium,
    /// 640px wide.
    Large,
}

impl GraphSize {
    /// Maximum image width in pixels.
    #[must_use]
    pub fn pixels(self) -> u32 {
        match self {
            Self::Small => 320,
            Self::Medium => 480,
            Self::Large => 640,
        }
    }
}

impl FromStr for GraphSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(ConfigError::Validation(format!(
                "unknown graph size '{other}' (expected small, medium or large)"
            ))),
        }
    }
}

impl fmt::Display for GraphSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        };
        f.write_str(name)
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Graph image size preset.
    pub graph_size: GraphSize,
    /// Group colours (CSS colour values), cycled by group index.
    pub palette: Vec<String>,
    /// Whether GitHub Flavored Markdown extensions are enabled.
    pub gfm: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            graph_size: GraphSize::default(),
            palette: DEFAULT_PALETTE.iter().map(|&c| c.to_owned()).collect(),
            gfm: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`api.token`").
        field: String,
        /// Error message (e.g., "${`MTGDOCS_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mtgdocs.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(user_id) = &settings.user_id {
            self.session_resolved.user_id = Some(user_id.clone());
        }
        if let Some(api_url) = &settings.api_url {
            match self.api.as_mut() {
                Some(api) => api.base_url.clone_from(api_url),
                None => {
                    self.api = Some(ApiConfig {
                        base_url: api_url.clone(),
                        token: None,
                        timeout_secs: default_timeout_secs(),
                    });
                }
            }
        }
        if let Some(graph_size) = settings.graph_size {
            self.render.graph_size = graph_size;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api) = &self.api {
            api.validate()?;
        }
        if let Some(user_id) = &self.session_resolved.user_id {
            require_non_empty(user_id, "session.user_id")?;
        }
        if self.render.palette.is_empty() {
            return Err(ConfigError::Validation(
                "render.palette must contain at least one colour".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut api) = self.api {
            api.base_url = expand::expand_env(&api.base_url, "api.base_url")?;
            if let Some(ref token) = api.token {
                api.token = Some(expand::expand_env(token, "api.token")?);
            }
        }

        if let Some(ref user_id) = self.session.user_id {
            self.session.user_id = Some(expand::expand_env(user_id, "session.user_id")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.session_resolved = SessionConfig {
            user_id: self.session.user_id.clone(),
            images_manifest: self
                .session
                .images_manifest
                .as_deref()
                .map(|p| config_dir.join(p)),
        };
    }
}
