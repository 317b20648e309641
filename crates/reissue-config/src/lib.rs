//! Configuration for the reissue client.
//!
//! A single YAML file (`client.yaml` in the config directory) holds the
//! backend base URL, request timeout, session endpoint paths and the token
//! file location. Environment variables override the file:
//!
//! - `REISSUE_API_URL` — base URL
//! - `REISSUE_TIMEOUT_MS` — request timeout in milliseconds
//! - `REISSUE_CONFIG_DIR` — config directory

pub mod client;
pub mod error;

pub use client::{
    API_URL_ENV, ClientConfig, CONFIG_DIR_ENV, EndpointsConfig, TIMEOUT_ENV, client_config_path,
    load_client_config, load_client_config_from, save_client_config_to, xdg_config_dir,
};
pub use error::{ConfigError, Result};
