//! Verify builders, the fetch wrapper and metrics against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use rewriteflow_core::{
    success_rate, AbuseReport, ApiError, FlowAnalytics, FlowApi, HttpMethod, HttpRequest,
    HttpResponse, RegisterUser, UpdateFlowEnv,
};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PATCH" => HttpMethod::Patch,
        other => panic!("unknown method: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn build_case(api: &FlowApi, token: &str, case: &serde_json::Value) -> HttpRequest {
    let id = case["input_id"].as_str().unwrap_or_default();
    match case["operation"].as_str().unwrap() {
        "register" => {
            let input: RegisterUser = serde_json::from_value(case["input"].clone()).unwrap();
            api.build_register(&input).unwrap()
        }
        "fetch_current_user" => api.build_fetch_current_user(token),
        "fetch_public_flow" => api.build_fetch_public_flow(id),
        "fetch_owned_flow" => api.build_fetch_owned_flow(token, id),
        "update_flow_env" => {
            let input: UpdateFlowEnv = serde_json::from_value(case["input"].clone()).unwrap();
            api.build_update_flow_env(token, &input).unwrap()
        }
        "list_owned_flows" => api.build_list_owned_flows(token),
        "fetch_owned_flow_code" => api.build_fetch_owned_flow_code(token, id),
        "report_abuse" => {
            let input: AbuseReport = serde_json::from_value(case["input"].clone()).unwrap();
            api.build_report_abuse(&input).unwrap()
        }
        other => panic!("unknown operation: {other}"),
    }
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let base_url = vectors["base_url"].as_str().unwrap();
    let token = vectors["token"].as_str().unwrap();
    let api = FlowApi::new(base_url);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];
        let req = build_case(&api, token, case);

        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{base_url}{}", expected_req["path"].as_str().unwrap()), "{name}: path");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match req.body.as_deref() {
            Some(body) => {
                let req_body: serde_json::Value = serde_json::from_str(body).unwrap();
                assert_eq!(req_body, expected_req["body"], "{name}: body");
            }
            None => assert!(expected_req["body"].is_null(), "{name}: body should be None"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let api = FlowApi::new("http://localhost:3000");
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let response = HttpResponse::new(status, case["body"].as_str().unwrap());

        let err = api.parse_user(response).unwrap_err();
        match &err {
            ApiError::Remote { status: got, message } => {
                assert_eq!(*got, status, "{name}: status");
                assert_eq!(message, case["expected_message"].as_str().unwrap(), "{name}: message");
            }
            other => panic!("{name}: expected Remote, got {other:?}"),
        }
        assert_eq!(err.to_string(), case["expected_message"].as_str().unwrap(), "{name}: display");
    }
}

// ---------------------------------------------------------------------------
// Success rate
// ---------------------------------------------------------------------------

#[test]
fn success_rate_test_vectors() {
    let raw = include_str!("../../test-vectors/success_rate.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let calls = case["calls"].as_u64().unwrap();
        let success = case["success"].as_u64().unwrap();
        let analytics = FlowAnalytics {
            calls,
            success,
            failure: calls - success,
        };
        let expected = case["expected"].as_f64().unwrap();
        assert_eq!(success_rate(&analytics), expected, "calls={calls} success={success}");
    }
}
