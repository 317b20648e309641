//! Request stage: attach the stored bearer token.

use std::sync::Arc;

use crate::request::ApiRequest;
use crate::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SharedTokenStore};
use crate::types::{Endpoints, Route};

/// Annotates outgoing requests with `Authorization: Bearer <token>`.
///
/// Login and signup go out untouched. The reissue endpoint gets the refresh
/// token, everything else the access token. Never fails: a missing token or a
/// store error leaves the request unauthenticated for the server to reject.
#[derive(Debug, Clone)]
pub struct CredentialStage {
    store: SharedTokenStore,
    endpoints: Arc<Endpoints>,
}

impl CredentialStage {
    pub fn new(store: SharedTokenStore, endpoints: Arc<Endpoints>) -> Self {
        Self { store, endpoints }
    }

    pub async fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if !request.attaches_credentials() {
            return request;
        }

        let key = match self.endpoints.classify(&request.method, &request.path) {
            Route::Login | Route::Signup => return request,
            Route::Reissue => REFRESH_TOKEN_KEY,
            Route::Resource => ACCESS_TOKEN_KEY,
        };

        match self.store.get(key).await {
            Ok(Some(token)) => {
                request.set_bearer(&token);
            }
            Ok(None) => {
                tracing::debug!(path = %request.path, key, "no stored token, sending unauthenticated");
            }
            Err(e) => {
                tracing::warn!(path = %request.path, key, error = %e, "token store read failed");
            }
        }
        request
    }
}
