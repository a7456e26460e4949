use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: f64,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FlowAnalytics {
    pub calls: u64,
    pub success: u64,
    pub failure: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub name: String,
    pub author: String,
    pub created_at: f64,
    pub last_modified: f64,
    pub analytics: FlowAnalytics,
    pub env: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicFlow {
    pub id: String,
    pub name: String,
    pub author: String,
    pub created_at: f64,
}

impl From<&Flow> for PublicFlow {
    fn from(flow: &Flow) -> Self {
        Self {
            id: flow.id.clone(),
            name: flow.name.clone(),
            author: flow.author.clone(),
            created_at: flow.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct UpdateEnv {
    pub id: String,
    pub env: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AbuseReport {
    pub username: String,
    pub message: String,
}

struct StoredUser {
    user: User,
    email: String,
}

struct StoredFlow {
    flow: Flow,
    code: String,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, StoredUser>,
    flows: HashMap<String, StoredFlow>,
    reports: Vec<AbuseReport>,
}

/// Shared in-memory backing store. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<RwLock<Inner>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session token issued to `username` at registration.
    pub async fn token_for(&self, username: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner
            .users
            .iter()
            .find(|(_, stored)| stored.user.username == username)
            .map(|(token, _)| token.clone())
    }

    /// Email address `username` registered with.
    pub async fn email_for(&self, username: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner
            .users
            .values()
            .find(|stored| stored.user.username == username)
            .map(|stored| stored.email.clone())
    }

    /// Create a flow owned by `author` with empty analytics and environment.
    pub async fn insert_flow(&self, author: &str, name: &str, code: &str) -> Flow {
        let now = now();
        let flow = Flow {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            author: author.to_string(),
            created_at: now,
            last_modified: now,
            analytics: FlowAnalytics::default(),
            env: BTreeMap::new(),
        };
        self.inner.write().await.flows.insert(
            flow.id.clone(),
            StoredFlow {
                flow: flow.clone(),
                code: code.to_string(),
            },
        );
        flow
    }

    /// Count one execution of flow `id`.
    pub async fn record_call(&self, id: &str, succeeded: bool) -> bool {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.flows.get_mut(id) else {
            return false;
        };
        let analytics = &mut stored.flow.analytics;
        analytics.calls += 1;
        if succeeded {
            analytics.success += 1;
        } else {
            analytics.failure += 1;
        }
        true
    }

    pub async fn reports(&self) -> Vec<AbuseReport> {
        self.inner.read().await.reports.clone()
    }
}

/// Error response in the `{"detail": "..."}` shape.
pub struct Detail(StatusCode, &'static str);

impl IntoResponse for Detail {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "detail": self.1 }))).into_response()
    }
}

const INVALID_TOKEN: Detail = Detail(StatusCode::UNAUTHORIZED, "Invalid token");
const FLOW_NOT_FOUND: Detail = Detail(StatusCode::NOT_FOUND, "Flow not found");

pub fn app() -> Router {
    app_with_state(MockState::new())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
        .route("/flows/flow/{id}", get(get_public_flow))
        .route("/flows/my/{id}", get(get_my_flow))
        .route("/flows/my/{id}/code", get(get_my_code))
        .route("/flows/update_env/{id}", patch(update_env))
        .route("/flows/list", get(list_flows))
        .route("/misc/report_abuser", post(report_abuser))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::new()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Resolve the raw `Authorization` header to a registered user.
fn authorize(inner: &Inner, headers: &HeaderMap) -> Result<User, Detail> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(INVALID_TOKEN)?;
    inner
        .users
        .get(token)
        .map(|stored| stored.user.clone())
        .ok_or(INVALID_TOKEN)
}

fn owned_flow<'a>(inner: &'a Inner, user: &User, id: &str) -> Result<&'a StoredFlow, Detail> {
    inner
        .flows
        .get(id)
        .filter(|stored| stored.flow.author == user.username)
        .ok_or(FLOW_NOT_FOUND)
}

async fn register(
    State(state): State<MockState>,
    Json(input): Json<RegisterUser>,
) -> Result<Json<User>, Detail> {
    if input.username.trim().is_empty() {
        return Err(Detail(StatusCode::BAD_REQUEST, "Username must not be empty"));
    }
    let mut inner = state.inner.write().await;
    if inner.users.values().any(|stored| stored.user.username == input.username) {
        return Err(Detail(StatusCode::CONFLICT, "Username already taken"));
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: input.username,
        created_at: now(),
    };
    let token = Uuid::new_v4().simple().to_string();
    tracing::info!(username = %user.username, email = %input.email, %token, "registered user");
    inner.users.insert(
        token,
        StoredUser {
            user: user.clone(),
            email: input.email,
        },
    );
    Ok(Json(user))
}

async fn me(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<User>, Detail> {
    let inner = state.inner.read().await;
    authorize(&inner, &headers).map(Json)
}

async fn get_public_flow(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<PublicFlow>, Detail> {
    let inner = state.inner.read().await;
    inner
        .flows
        .get(&id)
        .map(|stored| Json(PublicFlow::from(&stored.flow)))
        .ok_or(FLOW_NOT_FOUND)
}

async fn get_my_flow(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Flow>, Detail> {
    let inner = state.inner.read().await;
    let user = authorize(&inner, &headers)?;
    owned_flow(&inner, &user, &id).map(|stored| Json(stored.flow.clone()))
}

async fn get_my_code(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<String>, Detail> {
    let inner = state.inner.read().await;
    let user = authorize(&inner, &headers)?;
    owned_flow(&inner, &user, &id).map(|stored| Json(stored.code.clone()))
}

async fn update_env(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateEnv>,
) -> Result<Json<Flow>, Detail> {
    if input.id != id {
        return Err(Detail(StatusCode::BAD_REQUEST, "Flow id mismatch"));
    }
    let mut inner = state.inner.write().await;
    let user = authorize(&inner, &headers)?;
    owned_flow(&inner, &user, &id)?;
    let stored = inner.flows.get_mut(&id).ok_or(FLOW_NOT_FOUND)?;
    stored.flow.env = input.env;
    stored.flow.last_modified = now();
    Ok(Json(stored.flow.clone()))
}

async fn list_flows(
    State(state): State<MockState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Flow>>, Detail> {
    let inner = state.inner.read().await;
    let user = authorize(&inner, &headers)?;
    let mut flows: Vec<Flow> = inner
        .flows
        .values()
        .filter(|stored| stored.flow.author == user.username)
        .map(|stored| stored.flow.clone())
        .collect();
    flows.sort_by(|a, b| a.created_at.total_cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(flows))
}

async fn report_abuser(
    State(state): State<MockState>,
    Json(report): Json<AbuseReport>,
) -> StatusCode {
    tracing::info!(username = %report.username, "abuse reported");
    state.inner.write().await.reports.push(report);
    StatusCode::NO_CONTENT
}
