//! Response stage: recover from an expired access token.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::credentials::CredentialStage;
use crate::pipeline::refresh::Refresher;
use crate::request::{ApiRequest, ApiResponse};
use crate::store::{REFRESH_TOKEN_KEY, SharedTokenStore};
use crate::transport::Transport;
use crate::types::{Endpoints, Route, SessionPolicy};

/// Which send of a logical request this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

/// Transport decorator that authenticates requests and reissues the session
/// once when the server reports an expired access token.
///
/// Each call tracks its own attempt count, so a request is retried at most once and
/// nothing is written back onto the caller's descriptor.
#[derive(Clone)]
pub struct AuthTransport {
    inner: Arc<dyn Transport>,
    credentials: CredentialStage,
    refresher: Refresher,
    store: SharedTokenStore,
    endpoints: Arc<Endpoints>,
    policy: SessionPolicy,
}

impl std::fmt::Debug for AuthTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTransport")
            .field("endpoints", &self.endpoints)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AuthTransport {
    pub fn new(
        inner: Arc<dyn Transport>,
        store: SharedTokenStore,
        endpoints: Endpoints,
        policy: SessionPolicy,
    ) -> Self {
        let endpoints = Arc::new(endpoints);
        let credentials = CredentialStage::new(Arc::clone(&store), Arc::clone(&endpoints));
        let refresher = Refresher::new(
            Arc::clone(&inner),
            Arc::clone(&store),
            Arc::clone(&endpoints),
            policy,
        );
        Self {
            inner,
            credentials,
            refresher,
            store,
            endpoints,
            policy,
        }
    }

    pub fn store(&self) -> &SharedTokenStore {
        &self.store
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Reissue the session now, using the stored refresh token.
    pub async fn refresh(&self) -> Result<String> {
        let refresh_token = match self.store.get(REFRESH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read refresh token");
                None
            }
        };
        Ok(self.refresher.refresh(refresh_token).await?)
    }

    /// Only requests that carry stored credentials are recovered. Bootstrap
    /// endpoints and opted-out requests must never be replayed with a token.
    fn should_recover(&self, request: &ApiRequest, response: &ApiResponse, attempt: Attempt) -> bool {
        if !request.attaches_credentials() {
            return false;
        }
        match self.endpoints.classify(&request.method, &request.path) {
            Route::Login | Route::Signup | Route::Reissue => false,
            Route::Resource => {
                response.status == self.policy.unauthenticated_status && attempt == Attempt::First
            }
        }
    }
}

#[async_trait]
impl Transport for AuthTransport {
    async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let mut attempt = Attempt::First;
        loop {
            let outgoing = self.credentials.apply(request.clone()).await;
            let response = self.inner.send(outgoing).await?;

            if !self.should_recover(&request, &response, attempt) {
                return Ok(response);
            }

            tracing::debug!(path = %request.path, "access token rejected, reissuing session");
            let access_token = self.refresh().await.inspect_err(|e| {
                tracing::warn!(path = %request.path, error = %e, "session could not be renewed");
            })?;

            request.set_bearer(&access_token);
            attempt = Attempt::Retry;
        }
    }
}
