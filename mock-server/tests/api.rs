use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, Flow, MockState, PublicFlow, User};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, token)
        .body(String::new())
        .unwrap()
}

/// Register `username` through the router and return its issued token.
async fn register(state: &MockState, username: &str) -> String {
    let body = format!(r#"{{"username":"{username}","email":"{username}@example.com"}}"#);
    let resp = app_with_state(state.clone())
        .oneshot(json_request("POST", "/auth/register", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    state.token_for(username).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn register_returns_user() {
    let state = MockState::new();
    let resp = app_with_state(state.clone())
        .oneshot(json_request(
            "POST",
            "/auth/register",
            r#"{"username":"ada","email":"ada@example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.username, "ada");
    assert_eq!(state.email_for("ada").await.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn register_duplicate_returns_409_detail() {
    let state = MockState::new();
    register(&state, "ada").await;

    let resp = app_with_state(state)
        .oneshot(json_request(
            "POST",
            "/auth/register",
            r#"{"username":"ada","email":"other@example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Username already taken");
}

#[tokio::test]
async fn register_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/auth/register", r#"{"username":"ada"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn me_without_token_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/auth/me").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Invalid token");
}

#[tokio::test]
async fn me_with_raw_token_returns_user() {
    let state = MockState::new();
    let token = register(&state, "ada").await;

    let resp = app_with_state(state)
        .oneshot(authed_get("/auth/me", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.username, "ada");
}

// --- flows ---

#[tokio::test]
async fn public_flow_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/flows/flow/missing")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_flow_is_redacted() {
    let state = MockState::new();
    let flow = state.insert_flow("ada", "Nightly", "print(1)").await;

    let resp = app_with_state(state)
        .oneshot(
            Request::builder()
                .uri(format!("/flows/flow/{}", flow.id))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body.get("env").is_none());
    let public: PublicFlow = serde_json::from_value(body).unwrap();
    assert_eq!(public.name, "Nightly");
}

#[tokio::test]
async fn other_users_flow_is_hidden() {
    let state = MockState::new();
    register(&state, "ada").await;
    let eve = register(&state, "eve").await;
    let flow = state.insert_flow("ada", "Nightly", "print(1)").await;

    let resp = app_with_state(state)
        .oneshot(authed_get(&format!("/flows/my/{}", flow.id), &eve))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_env_id_mismatch_returns_400() {
    let state = MockState::new();
    let token = register(&state, "ada").await;
    let flow = state.insert_flow("ada", "Nightly", "print(1)").await;

    let mut req = json_request(
        "PATCH",
        &format!("/flows/update_env/{}", flow.id),
        r#"{"id":"other","env":{}}"#,
    );
    req.headers_mut()
        .insert(http::header::AUTHORIZATION, token.parse().unwrap());
    let resp = app_with_state(state).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_abuser_records_report() {
    let state = MockState::new();
    let resp = app_with_state(state.clone())
        .oneshot(json_request(
            "POST",
            "/misc/report_abuser",
            r#"{"username":"eve","message":"phishing"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
    let reports = state.reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].username, "eve");
}

// --- full owner lifecycle ---

#[tokio::test]
async fn owner_lifecycle() {
    use tower::Service;

    let state = MockState::new();
    let token = register(&state, "ada").await;
    let first = state.insert_flow("ada", "First", "print(1)").await;
    state.insert_flow("ada", "Second", "print(2)").await;
    state.insert_flow("eve", "Foreign", "print(3)").await;
    state.record_call(&first.id, true).await;

    let mut app = app_with_state(state).into_service();

    // list — only ada's flows
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get("/flows/list", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let flows: Vec<Flow> = body_json(resp).await;
    assert_eq!(flows.len(), 2);
    assert!(flows.iter().all(|f| f.author == "ada"));

    // get owned flow
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get(&format!("/flows/my/{}", first.id), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Flow = body_json(resp).await;
    assert_eq!(fetched.analytics.calls, 1);
    assert!(fetched.env.is_empty());

    // update env
    let mut req = json_request(
        "PATCH",
        &format!("/flows/update_env/{}", first.id),
        &format!(r#"{{"id":"{}","env":{{"API_KEY":"secret"}}}}"#, first.id),
    );
    req.headers_mut()
        .insert(http::header::AUTHORIZATION, token.parse().unwrap());
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(req)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Flow = body_json(resp).await;
    assert_eq!(updated.env.get("API_KEY").map(String::as_str), Some("secret"));
    assert!(updated.last_modified >= first.last_modified);

    // code
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get(&format!("/flows/my/{}/code", first.id), &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let code: String = body_json(resp).await;
    assert_eq!(code, "print(1)");
}
