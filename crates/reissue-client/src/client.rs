//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use url::Url;

use crate::api::AuthApi;
use crate::error::{Error, ErrorResponse, Result};
use crate::pipeline::AuthTransport;
use crate::request::{ApiRequest, ApiResponse};
use crate::store::{MemoryTokenStore, SharedTokenStore};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Endpoints, Session, SessionPolicy};

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Authenticated API client.
///
/// Every request goes through the auth pipeline: the stored access token is
/// attached, and an expired token is reissued once before the request is
/// retried.
///
/// # Example
///
/// ```no_run
/// use reissue_client::ApiClient;
///
/// # async fn example() -> reissue_client::Result<()> {
/// let client = ApiClient::builder()
///     .base_url("http://localhost:8080")
///     .build()?;
///
/// let orders: serde_json::Value = client.get("/orders").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    pipeline: AuthTransport,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The token store backing this client.
    pub fn store(&self) -> &SharedTokenStore {
        self.inner.pipeline.store()
    }

    /// Session endpoint paths.
    pub fn endpoints(&self) -> &Endpoints {
        self.inner.pipeline.endpoints()
    }

    /// Access the authentication API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Read the stored session.
    pub async fn session(&self) -> Result<Session> {
        Ok(self.store().load_session().await?)
    }

    /// Reissue the session now. Returns the new access token.
    pub async fn refresh(&self) -> Result<String> {
        self.inner.pipeline.refresh().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request through the pipeline and return the raw response,
    /// whatever its status.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.inner.pipeline.send(request).await
    }

    /// Send a request and decode a successful JSON body.
    pub async fn execute<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        self.handle_response(response)
    }

    /// Make a GET request.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(ApiRequest::get(path)).await
    }

    /// Make a POST request.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.execute(ApiRequest::post(path).with_json(body)?).await
    }

    /// Make a PATCH request.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.execute(ApiRequest::patch(path).with_json(body)?).await
    }

    /// Make a PUT request.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.execute(ApiRequest::put(path).with_json(body)?).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.send(ApiRequest::delete(path)).await?;
        if !response.is_success() {
            return Err(self.extract_error(&response));
        }
        Ok(())
    }

    /// Handle a response, extracting the body or error.
    fn handle_response<T: serde::de::DeserializeOwned>(&self, response: ApiResponse) -> Result<T> {
        if response.is_success() {
            response.json()
        } else {
            Err(self.extract_error(&response))
        }
    }

    /// Extract an error from a failed response.
    pub(crate) fn extract_error(&self, response: &ApiResponse) -> Error {
        let status = response.status;
        let unauthenticated = self.inner.pipeline.policy().unauthenticated_status;

        match response.json::<ErrorResponse>() {
            Ok(err) => {
                if status == StatusCode::NOT_FOUND {
                    Error::NotFound(err.message)
                } else if status == unauthenticated {
                    Error::Auth(err.message)
                } else {
                    Error::Api {
                        status: status.as_u16(),
                        code: err.code.unwrap_or_else(|| "unknown".to_string()),
                        message: err.message,
                    }
                }
            }
            Err(_) => {
                let message = format!("HTTP {}", status.as_u16());
                if status == unauthenticated {
                    Error::Auth(message)
                } else {
                    Error::Api {
                        status: status.as_u16(),
                        code: "unknown".to_string(),
                        message,
                    }
                }
            }
        }
    }
}

/// Builder for creating an [`ApiClient`].
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    store: Option<SharedTokenStore>,
    endpoints: Endpoints,
    policy: SessionPolicy,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            store: None,
            endpoints: Endpoints::default(),
            policy: SessionPolicy::default(),
            transport: None,
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the token store. Defaults to an in-memory store.
    pub fn token_store(mut self, store: SharedTokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the session endpoint paths.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the status that signals an expired access token.
    pub fn unauthenticated_status(mut self, status: StatusCode) -> Self {
        self.policy.unauthenticated_status = status;
        self
    }

    /// Whether a rejected reissue clears the stored session.
    pub fn clear_session_on_rejected_refresh(mut self, clear: bool) -> Self {
        self.policy.clear_on_rejected_refresh = clear;
        self
    }

    /// Replace the HTTP transport. The auth pipeline still wraps it.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

                let user_agent = self
                    .user_agent
                    .unwrap_or_else(|| format!("reissue-client/{}", env!("CARGO_PKG_VERSION")));

                let http = reqwest::Client::builder()
                    .default_headers(headers)
                    .user_agent(user_agent)
                    .build()?;

                Arc::new(HttpTransport::new(http, base_url.clone(), self.timeout))
            }
        };

        let store: SharedTokenStore = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryTokenStore::new()),
        };

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                pipeline: AuthTransport::new(transport, store, self.endpoints, self.policy),
                base_url,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
