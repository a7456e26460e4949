//! Stateless HTTP request builder and response parser for the rewriteflow API.
//!
//! # Design
//! `FlowApi` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Authorized builders take the session token explicitly; the caller decides
//! where it comes from.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::fetch::ensure_success;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AbuseReport, Flow, FlowCode, PublicFlow, RegisterUser, UpdateFlowEnv, User,
};

/// Synchronous, stateless request builder for the rewriteflow API.
#[derive(Debug, Clone)]
pub struct FlowApi {
    base_url: String,
}

impl FlowApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_register(&self, input: &RegisterUser) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/register", None, input)
    }

    pub fn build_fetch_current_user(&self, token: &str) -> HttpRequest {
        self.get("/auth/me", Some(token))
    }

    pub fn build_fetch_public_flow(&self, id: &str) -> HttpRequest {
        self.get(&format!("/flows/flow/{id}"), None)
    }

    pub fn build_fetch_owned_flow(&self, token: &str, id: &str) -> HttpRequest {
        self.get(&format!("/flows/my/{id}"), Some(token))
    }

    pub fn build_update_flow_env(
        &self,
        token: &str,
        input: &UpdateFlowEnv,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/flows/update_env/{}", input.id);
        self.json_request(HttpMethod::Patch, &path, Some(token), input)
    }

    pub fn build_list_owned_flows(&self, token: &str) -> HttpRequest {
        self.get("/flows/list", Some(token))
    }

    pub fn build_fetch_owned_flow_code(&self, token: &str, id: &str) -> HttpRequest {
        self.get(&format!("/flows/my/{id}/code"), Some(token))
    }

    pub fn build_report_abuse(&self, input: &AbuseReport) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/misc/report_abuser", None, input)
    }

    pub fn parse_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    pub fn parse_public_flow(&self, response: HttpResponse) -> Result<PublicFlow, ApiError> {
        parse_json(response)
    }

    pub fn parse_flow(&self, response: HttpResponse) -> Result<Flow, ApiError> {
        parse_json(response)
    }

    pub fn parse_flows(&self, response: HttpResponse) -> Result<Vec<Flow>, ApiError> {
        parse_json(response)
    }

    pub fn parse_flow_code(&self, response: HttpResponse) -> Result<FlowCode, ApiError> {
        parse_json(response)
    }

    /// Accept any successful response and ignore its body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        ensure_success(response)?;
        Ok(())
    }

    fn get(&self, path: &str, token: Option<&str>) -> HttpRequest {
        let mut headers = Vec::new();
        push_authorization(&mut headers, token);
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        input: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        push_authorization(&mut headers, token);
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body: Some(body),
        })
    }
}

/// The token goes into `authorization` verbatim, with no scheme prefix.
fn push_authorization(headers: &mut Vec<(String, String)>, token: Option<&str>) {
    if let Some(token) = token {
        headers.push(("authorization".to_string(), token.to_string()));
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let response = ensure_success(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
