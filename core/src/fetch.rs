//! Failure normalization shared by every endpoint call.
//!
//! A non-2xx response is turned into `ApiError::Remote` carrying the most
//! readable message the body offers: a `detail` field, then a `message`
//! field, then the raw text.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::HttpTransport;

/// Execute `request` and normalize a failing status into an error.
pub async fn fetch<T>(transport: &T, request: HttpRequest) -> Result<HttpResponse, ApiError>
where
    T: HttpTransport + ?Sized,
{
    let method = request.method;
    let path = request.path.clone();
    tracing::debug!(method = method.as_str(), %path, "sending request");

    let response = transport.execute(request).await.inspect_err(|err| {
        tracing::debug!(method = method.as_str(), %path, error = %err, "request failed");
    })?;

    tracing::debug!(method = method.as_str(), %path, status = response.status, "received response");
    ensure_success(response)
}

/// Pass a 2xx response through unchanged; map anything else to `Remote`.
pub fn ensure_success(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::Remote {
        status: response.status,
        message: error_message(&response.body),
    })
}

/// Extract a human-readable message from an error body.
pub fn error_message(body: &str) -> String {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    ["detail", "message"]
        .iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| is_truthy(value))
        .map(render)
        .unwrap_or_else(|| body.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
