//! Authenticated HTTP client with coordinated token reissue.
//!
//! Outgoing requests carry the stored access token. When the server answers
//! `401`, the client exchanges the refresh token for a new pair, stores it and
//! replays the request once. Concurrent expiries share a single reissue.
//!
//! # Example
//!
//! ```no_run
//! use reissue_client::{ApiClient, LoginRequest, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:8080")
//!     .build()?;
//!
//! client.auth().login(&LoginRequest::new("kim", "secret")).await?;
//!
//! // Expired tokens are reissued transparently.
//! let orders: serde_json::Value = client.get("/orders").await?;
//! println!("{orders}");
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`store`] — token persistence (`TokenStore`, file and in-memory stores)
//! - [`transport`] — `Transport` trait and the reqwest-backed `HttpTransport`
//! - [`pipeline`] — credential stage, single-flight reissue, retry-once decorator
//! - [`client`] — `ApiClient` and its builder
//! - [`api`] — login, signup, OAuth login, logout

pub mod api;
pub mod client;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod store;
pub mod transport;
pub mod types;

pub use api::AuthApi;
pub use client::{ApiClient, ClientBuilder, DEFAULT_TIMEOUT};
pub use error::{Error, RefreshError, Result, StoreError};
pub use pipeline::{AuthTransport, CredentialStage, Refresher};
pub use request::{ApiRequest, ApiResponse};
pub use store::{
    ACCESS_TOKEN_KEY, FileTokenStore, MemoryTokenStore, REFRESH_TOKEN_KEY, SharedTokenStore,
    TokenStore,
};
pub use transport::{HttpTransport, Transport};
pub use types::*;
