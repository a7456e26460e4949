//! Domain DTOs for the rewriteflow API.
//!
//! # Design
//! These types mirror the server's JSON schema but are defined independently
//! of the mock-server crate. Integration tests catch any schema drift between
//! the two. Timestamps are `f64` because the server may send fractional
//! seconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Environment variables attached to a flow, keyed by variable name.
pub type FlowEnv = BTreeMap<String, String>;

/// Source payload returned by `/flows/my/{id}/code`. Its shape is not fixed by
/// the server, so it stays untyped JSON.
pub type FlowCode = serde_json::Value;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: f64,
}

/// Execution counters for a flow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowAnalytics {
    pub calls: u64,
    pub success: u64,
    pub failure: u64,
}

/// A flow as seen by its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flow {
    pub id: String,
    pub name: String,
    pub author: String,
    pub created_at: f64,
    pub last_modified: f64,
    pub analytics: FlowAnalytics,
    #[serde(default)]
    pub env: FlowEnv,
}

impl Flow {
    pub fn success_rate(&self) -> f64 {
        crate::metrics::success_rate(&self.analytics)
    }
}

/// The redacted view of a flow served to unauthenticated callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicFlow {
    pub id: String,
    pub name: String,
    pub author: String,
    pub created_at: f64,
}

/// Request payload for `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
}

/// Request payload for `/flows/update_env/{id}`. The full mapping replaces the
/// flow's environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFlowEnv {
    pub id: String,
    pub env: FlowEnv,
}

/// Request payload for `/misc/report_abuser`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbuseReport {
    pub username: String,
    pub message: String,
}
