//! Session-holding async client for the rewriteflow API.
//!
//! # Design
//! `RewriteFlow` pairs the stateless `FlowApi` with an injected transport and
//! an injected token store. The token lives in memory and is mirrored into
//! the store; the in-memory copy is authoritative, so a failing store is
//! logged and never fails an operation. The token mutex is only held for
//! synchronous reads and writes, never across an `.await`.

use std::sync::{Mutex, PoisonError};

use crate::api::FlowApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, StorageError};
use crate::fetch::fetch;
use crate::http::{HttpRequest, HttpResponse};
use crate::storage::{FileTokenStore, TokenStore, TOKEN_KEY};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{
    AbuseReport, Flow, FlowCode, FlowEnv, PublicFlow, RegisterUser, UpdateFlowEnv, User,
};

/// Async client for the rewriteflow API with a persisted session token.
pub struct RewriteFlow<T, S> {
    api: FlowApi,
    transport: T,
    store: S,
    token: Mutex<Option<String>>,
}

impl RewriteFlow<ReqwestTransport, FileTokenStore> {
    /// Client over HTTP with the token persisted in a file.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StorageError> {
        let store = match &config.storage_path {
            Some(path) => FileTokenStore::new(path),
            None => FileTokenStore::new(FileTokenStore::default_path()?),
        };
        Ok(Self::new(&config.base_url, ReqwestTransport::new(), store))
    }
}

impl<T, S> RewriteFlow<T, S>
where
    T: HttpTransport,
    S: TokenStore,
{
    /// Build a client, restoring any token left in `store` by a previous run.
    pub fn new(base_url: &str, transport: T, store: S) -> Self {
        let token = match store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored token, starting signed out");
                None
            }
        };
        Self {
            api: FlowApi::new(base_url),
            transport,
            store,
            token: Mutex::new(token),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The token currently held, if any.
    pub fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True when a token is held. Does not check it with the server.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some_and(|token| !token.is_empty())
    }

    pub async fn register(&self, username: &str, email: &str) -> Result<User, ApiError> {
        let request = self.api.build_register(&RegisterUser {
            username: username.to_string(),
            email: email.to_string(),
        })?;
        let response = self.send(request).await?;
        self.api.parse_user(response)
    }

    /// Adopt `token` and validate it by fetching the current user.
    ///
    /// On failure the token is cleared again before the error is returned.
    pub async fn authenticate(&self, token: &str) -> Result<User, ApiError> {
        self.set_token(token);
        match self.fetch_current_user().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "authenticated");
                Ok(user)
            }
            Err(err) => {
                tracing::info!(error = %err, "authentication failed, clearing token");
                self.unset_token();
                Err(err)
            }
        }
    }

    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        let token = self.require_token()?;
        let response = self.send(self.api.build_fetch_current_user(&token)).await?;
        self.api.parse_user(response)
    }

    pub async fn fetch_public_flow(&self, id: &str) -> Result<PublicFlow, ApiError> {
        let response = self.send(self.api.build_fetch_public_flow(id)).await?;
        self.api.parse_public_flow(response)
    }

    pub async fn fetch_owned_flow(&self, id: &str) -> Result<Flow, ApiError> {
        let token = self.require_token()?;
        let response = self.send(self.api.build_fetch_owned_flow(&token, id)).await?;
        self.api.parse_flow(response)
    }

    /// Replace the flow's environment. Any 2xx counts as success.
    pub async fn update_flow_environment(&self, id: &str, env: FlowEnv) -> Result<(), ApiError> {
        let token = self.require_token()?;
        let request = self.api.build_update_flow_env(
            &token,
            &UpdateFlowEnv {
                id: id.to_string(),
                env,
            },
        )?;
        let response = self.send(request).await?;
        self.api.parse_empty(response)
    }

    pub async fn list_owned_flows(&self) -> Result<Vec<Flow>, ApiError> {
        let token = self.require_token()?;
        let response = self.send(self.api.build_list_owned_flows(&token)).await?;
        self.api.parse_flows(response)
    }

    pub async fn fetch_owned_flow_code(&self, id: &str) -> Result<FlowCode, ApiError> {
        let token = self.require_token()?;
        let response = self
            .send(self.api.build_fetch_owned_flow_code(&token, id))
            .await?;
        self.api.parse_flow_code(response)
    }

    /// Forget the token locally. The server is not told.
    pub fn logout(&self) {
        tracing::info!("logging out");
        self.unset_token();
    }

    pub async fn report_abuse(&self, username: &str, message: &str) -> Result<(), ApiError> {
        let request = self.api.build_report_abuse(&AbuseReport {
            username: username.to_string(),
            message: message.to_string(),
        })?;
        let response = self.send(request).await?;
        self.api.parse_empty(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        fetch(&self.transport, request).await
    }

    fn require_token(&self) -> Result<String, ApiError> {
        self.token()
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::NoToken)
    }

    fn set_token(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        if let Err(err) = self.store.set(TOKEN_KEY, token) {
            tracing::warn!(error = %err, "could not persist token");
        }
    }

    fn unset_token(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(err) = self.store.remove(TOKEN_KEY) {
            tracing::warn!(error = %err, "could not remove persisted token");
        }
    }
}
