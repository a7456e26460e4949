//! Async API client core for the rewriteflow service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values as plain data
//! (host-does-IO pattern) and wraps them in `RewriteFlow`, a session client
//! whose HTTP transport and token storage are injected. Tests swap in
//! `MemoryTransport` and `MemoryTokenStore` for fully deterministic runs.
//!
//! # Design
//! - `FlowApi` is stateless: it holds only `base_url`.
//! - Each endpoint is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - Every non-2xx response goes through `fetch::ensure_success`, which
//!   extracts a readable message from the error body.
//! - `RewriteFlow` owns the only mutable state: the session token.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod metrics;
pub mod storage;
pub mod token;
pub mod transport;
pub mod types;

pub use api::FlowApi;
pub use client::RewriteFlow;
pub use config::ClientConfig;
pub use error::{ApiError, StorageError};
pub use fetch::{ensure_success, error_message, fetch};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use metrics::success_rate;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use token::generate_demo_token;
pub use transport::{HttpTransport, MemoryTransport, ReqwestTransport};
pub use types::{
    AbuseReport, Flow, FlowAnalytics, FlowCode, FlowEnv, PublicFlow, RegisterUser, UpdateFlowEnv,
    User,
};
