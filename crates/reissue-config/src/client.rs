//! Client configuration.
//!
//! ```yaml
//! api-version: v1
//! kind: ClientConfig
//!
//! base-url: https://api.example.com
//! timeout-ms: 2000
//! unauthenticated-status: 401
//! clear-session-on-rejected-refresh: true
//! token-file: ~/.local/share/reissue/tokens.json
//!
//! endpoints:
//!   login: /users/login
//!   signup: /users
//!   reissue: /users/reissue
//!   oauth-login: /users/oauth
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Client Config
// ─────────────────────────────────────────────────────────────────────────────

/// API version for the client config file format.
pub const API_VERSION: &str = "v1";

/// Kind identifier for client config files.
pub const KIND: &str = "ClientConfig";

/// Default config filename.
const CLIENT_CONFIG_FILE: &str = "client.yaml";

/// Default token filename, next to the config file.
const TOKEN_FILE: &str = "tokens.json";

/// Application name for config directory resolution.
const APP_NAME: &str = "reissue";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "REISSUE_CONFIG_DIR";

/// Environment variable overriding the base URL.
pub const API_URL_ENV: &str = "REISSUE_API_URL";

/// Environment variable overriding the request timeout (milliseconds).
pub const TIMEOUT_ENV: &str = "REISSUE_TIMEOUT_MS";

/// Root client configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientConfig {
    /// API version (always "v1" currently).
    pub api_version: String,

    /// Config kind (always "ClientConfig").
    pub kind: String,

    /// Backend base URL; every endpoint path is relative to it.
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Status the backend uses for an invalid or expired access token.
    pub unauthenticated_status: u16,

    /// Clear stored tokens when the reissue endpoint rejects the refresh token.
    pub clear_session_on_rejected_refresh: bool,

    /// Token file; defaults to `tokens.json` in the config directory.
    pub token_file: Option<PathBuf>,

    /// Session endpoint paths.
    pub endpoints: EndpointsConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            base_url: None,
            timeout_ms: 2000,
            unauthenticated_status: 401,
            clear_session_on_rejected_refresh: true,
            token_file: None,
            endpoints: EndpointsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Apply `REISSUE_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.base_url = Some(url);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.is_empty()) {
            self.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: TIMEOUT_ENV.to_string(),
                reason: format!("'{}' is not a number of milliseconds", raw),
            })?;
        }
        Ok(())
    }

    /// Check values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout-ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(400..=599).contains(&self.unauthenticated_status) {
            return Err(ConfigError::InvalidValue {
                field: "unauthenticated-status".to_string(),
                reason: format!("{} is not an HTTP error status", self.unauthenticated_status),
            });
        }
        for (field, path) in self.endpoints.iter() {
            if path.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                    context: "endpoints".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The base URL, or an error naming how to set it.
    pub fn require_base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: format!("base-url (or {})", API_URL_ENV),
                context: "client config".to_string(),
            })
    }

    /// Effective token file path.
    pub fn token_path(&self) -> Option<PathBuf> {
        match &self.token_file {
            Some(path) => Some(expand_path(path)),
            None => xdg_config_dir().map(|d| d.join(TOKEN_FILE)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Endpoints
// ─────────────────────────────────────────────────────────────────────────────

/// Session endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EndpointsConfig {
    pub login: String,
    pub signup: String,
    pub reissue: String,
    pub oauth_login: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            login: "/users/login".to_string(),
            signup: "/users".to_string(),
            reissue: "/users/reissue".to_string(),
            oauth_login: "/users/oauth".to_string(),
        }
    }
}

impl EndpointsConfig {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("login", self.login.as_str()),
            ("signup", self.signup.as_str()),
            ("reissue", self.reissue.as_str()),
            ("oauth-login", self.oauth_login.as_str()),
        ]
        .into_iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading / Saving
// ─────────────────────────────────────────────────────────────────────────────

/// Get the config directory.
///
/// Checks `REISSUE_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the path to the client config file.
pub fn client_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(CLIENT_CONFIG_FILE))
}

/// Load the client configuration.
///
/// Returns a default config if the file doesn't exist.
pub fn load_client_config() -> Result<ClientConfig> {
    load_client_config_from(client_config_path().as_deref())
}

/// Load client config from a specific path.
pub fn load_client_config_from(path: Option<&Path>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::new());
    };

    if !path.exists() {
        return Ok(ClientConfig::new());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;

    ClientConfig::from_yaml(&contents)
}

/// Save client config to a specific path.
pub fn save_client_config_to(config: &ClientConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_yaml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Expand ~ to home directory in paths.
fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
