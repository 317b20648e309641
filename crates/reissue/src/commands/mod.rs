//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod request;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use reqwest::StatusCode;
use reissue_client::{ApiClient, Endpoints, FileTokenStore};
use reissue_config::ClientConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective client configuration.
    pub config: ClientConfig,
    /// Config file the settings were loaded from, if any.
    pub config_path: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Token file used by every command.
    pub fn token_path(&self) -> Result<PathBuf> {
        self.config
            .token_path()
            .context("Could not determine config directory for the token file")
    }

    /// Build an API client backed by the token file.
    pub fn client(&self) -> Result<ApiClient> {
        let config = &self.config;
        let base_url = config.require_base_url()?;
        let status = StatusCode::from_u16(config.unauthenticated_status)
            .context("invalid unauthenticated-status")?;

        let endpoints = Endpoints {
            login: config.endpoints.login.clone(),
            signup: config.endpoints.signup.clone(),
            reissue: config.endpoints.reissue.clone(),
            oauth_login: config.endpoints.oauth_login.clone(),
        };

        let client = ApiClient::builder()
            .base_url(base_url)
            .timeout(Duration::from_millis(config.timeout_ms))
            .token_store(Arc::new(FileTokenStore::with_path(self.token_path()?)))
            .endpoints(endpoints)
            .unauthenticated_status(status)
            .clear_session_on_rejected_refresh(config.clear_session_on_rejected_refresh)
            .build()?;
        Ok(client)
    }
}

/// Turn a client error into a CLI-facing message.
pub fn describe(err: reissue_client::Error) -> anyhow::Error {
    if err.requires_login() {
        anyhow::anyhow!("{}\nRun 'reissue login' to sign in again.", err)
    } else {
        anyhow::Error::new(err)
    }
}

/// Mask a token for display, keeping four characters at each end.
pub fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}
