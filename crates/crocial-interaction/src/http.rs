//! Shared HTTP error classification for every gateway client.
//!
//! Transport failures become network errors (retryable when the connection
//! or timeout is at fault), 401/403 become auth errors, and every other
//! non-success status is a remote rejection carrying the provider's error
//! message when one can be parsed out of the body.

use crocial_core::CrocialError;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

/// Maps a reqwest transport error into the error taxonomy.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> CrocialError {
    CrocialError::Network {
        message: format!("{context}: {err}"),
        retryable: err.is_connect() || err.is_timeout(),
    }
}

/// Consumes a non-success response into a classified error.
pub(crate) async fn error_from_response(context: &str, response: Response) -> CrocialError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = parse_error_message(&body).unwrap_or_else(|| truncate(&body));
    tracing::warn!(target: "gateway", %status, "{context} failed: {message}");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CrocialError::auth(format!("{context}: {message}"))
        }
        _ => CrocialError::remote(status.as_u16(), format!("{context}: {message}")),
    }
}

/// Returns the response for further parsing, or a classified error.
pub(crate) async fn ensure_success(
    context: &str,
    result: Result<Response, reqwest::Error>,
) -> Result<Response, CrocialError> {
    let response = result.map_err(|err| transport_error(context, err))?;
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(context, response).await)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<serde_json::Value>,
}

/// Best-effort extraction of a human-readable message from a provider error
/// body. Providers disagree on shape: `{"message": ...}`,
/// `{"error": "..."}`, and `{"error": {"message": ...}}` are all in use.
fn parse_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    if let Some(message) = envelope.message {
        return Some(message);
    }
    match envelope.error? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}
