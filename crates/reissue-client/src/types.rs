//! Request and response types for the authentication endpoints.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Token pair returned by login, signup, OAuth login and reissue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The stored session. Either token may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    /// True when an access token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// True when a reissue can be attempted.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl From<TokenPair> for Session {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: Some(pair.access_token),
            refresh_token: Some(pair.refresh_token),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Credentials for the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub auth_id: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(auth_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_id: auth_id.into(),
            password: password.into(),
        }
    }
}

/// Account registration payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupRequest {
    pub auth_id: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Identity obtained from an OAuth provider, forwarded as-is to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProfile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Endpoints
// ─────────────────────────────────────────────────────────────────────────────

/// Default login path.
pub const DEFAULT_LOGIN_PATH: &str = "/users/login";

/// Default signup path (POST).
pub const DEFAULT_SIGNUP_PATH: &str = "/users";

/// Default token reissue path.
pub const DEFAULT_REISSUE_PATH: &str = "/users/reissue";

/// Default OAuth login path.
pub const DEFAULT_OAUTH_LOGIN_PATH: &str = "/users/oauth";

/// Paths of the session endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub signup: String,
    pub reissue: String,
    pub oauth_login: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_PATH.to_string(),
            signup: DEFAULT_SIGNUP_PATH.to_string(),
            reissue: DEFAULT_REISSUE_PATH.to_string(),
            oauth_login: DEFAULT_OAUTH_LOGIN_PATH.to_string(),
        }
    }
}

/// How the pipeline treats a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login; precedes any session.
    Login,
    /// Account creation; precedes any session.
    Signup,
    /// Token reissue; authenticated with the refresh token.
    Reissue,
    /// Everything else; authenticated with the access token.
    Resource,
}

impl Endpoints {
    /// Classify a request target.
    ///
    /// Paths compare without leading slashes or query strings.
    pub fn classify(&self, method: &Method, path: &str) -> Route {
        let path = normalize(path);
        if path == normalize(&self.login) {
            Route::Login
        } else if path == normalize(&self.signup) && *method == Method::POST {
            Route::Signup
        } else if path == normalize(&self.reissue) {
            Route::Reissue
        } else {
            Route::Resource
        }
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or(path);
    path.trim_start_matches('/')
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Session recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Status that signals an invalid or expired access token.
    pub unauthenticated_status: StatusCode,
    /// Clear the stored session when the reissue endpoint rejects the refresh token.
    pub clear_on_rejected_refresh: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            unauthenticated_status: StatusCode::UNAUTHORIZED,
            clear_on_rejected_refresh: true,
        }
    }
}
