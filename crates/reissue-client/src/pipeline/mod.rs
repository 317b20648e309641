//! The authenticated request pipeline.
//!
//! - [`credentials`] — request stage: attach the stored bearer token
//! - [`refresh`] — single-flight token reissue
//! - [`auth`] — response stage: reissue on 401 and retry once

pub mod auth;
pub mod credentials;
pub mod refresh;

pub use auth::AuthTransport;
pub use credentials::CredentialStage;
pub use refresh::Refresher;
