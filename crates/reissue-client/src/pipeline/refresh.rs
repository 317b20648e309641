//! Token reissue with single-flight coordination.
//!
//! Concurrent callers share one in-flight reissue: the first caller starts it,
//! the rest await the same outcome. The handle is dropped once the reissue
//! settles, so the next expiry triggers a new one.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::error::RefreshError;
use crate::pipeline::credentials::CredentialStage;
use crate::request::ApiRequest;
use crate::store::SharedTokenStore;
use crate::transport::Transport;
use crate::types::{Endpoints, SessionPolicy, TokenPair};

type InFlight = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// Exchanges the refresh token for a new session.
#[derive(Clone)]
pub struct Refresher {
    inner: Arc<RefresherInner>,
}

struct RefresherInner {
    transport: Arc<dyn Transport>,
    credentials: CredentialStage,
    store: SharedTokenStore,
    endpoints: Arc<Endpoints>,
    policy: SessionPolicy,
    in_flight: Mutex<Option<InFlight>>,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("reissue", &self.inner.endpoints.reissue)
            .field("in_flight", &self.inner.in_flight.lock().is_some())
            .finish()
    }
}

impl Refresher {
    /// `transport` must be the raw transport, not the auth pipeline, so a 401
    /// from the reissue endpoint can never recurse into another refresh.
    pub fn new(
        transport: Arc<dyn Transport>,
        store: SharedTokenStore,
        endpoints: Arc<Endpoints>,
        policy: SessionPolicy,
    ) -> Self {
        let credentials = CredentialStage::new(Arc::clone(&store), Arc::clone(&endpoints));
        Self {
            inner: Arc::new(RefresherInner {
                transport,
                credentials,
                store,
                endpoints,
                policy,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Reissue tokens, joining a reissue already in progress.
    ///
    /// Returns the new access token. Both tokens are persisted before this
    /// resolves.
    pub async fn refresh(&self, refresh_token: Option<String>) -> Result<String, RefreshError> {
        let flight = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some(flight) => {
                    tracing::debug!("joining in-flight token reissue");
                    flight.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let flight = async move { inner.reissue(refresh_token).await }
                        .boxed()
                        .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        let result = flight.clone().await;

        let mut slot = self.inner.in_flight.lock();
        if slot.as_ref().is_some_and(|f| f.ptr_eq(&flight)) {
            *slot = None;
        }
        result
    }
}

impl RefresherInner {
    async fn reissue(&self, refresh_token: Option<String>) -> Result<String, RefreshError> {
        tracing::info!(path = %self.endpoints.reissue, "refreshing access token");

        let Some(refresh_token) = refresh_token else {
            tracing::warn!("no refresh token stored, cannot reissue");
            return Err(RefreshError::MissingToken);
        };

        let mut request = ApiRequest::post(self.endpoints.reissue.clone());
        request.set_bearer(&refresh_token);
        let request = self.credentials.apply(request).await;

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(error = %e, "token reissue request failed");
            RefreshError::Transport(e.to_string())
        })?;

        if !response.is_success() {
            let status = response.status.as_u16();
            tracing::warn!(status, "token reissue rejected");
            if self.policy.clear_on_rejected_refresh
                && let Err(e) = self.store.clear_session().await
            {
                tracing::warn!(error = %e, "failed to clear rejected session");
            }
            return Err(RefreshError::Rejected { status });
        }

        let tokens: TokenPair = response
            .json()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        self.store
            .save_session(&tokens)
            .await
            .map_err(|e| RefreshError::Store(e.to_string()))?;

        tracing::info!("access token refreshed");
        Ok(tokens.access_token)
    }
}
