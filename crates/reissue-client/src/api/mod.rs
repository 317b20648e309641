//! API endpoint implementations.

mod auth;

pub use auth::AuthApi;
