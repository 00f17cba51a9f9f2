//! PSK-based authentication for the bridge-facing API.
//!
//! Keys are compared in constant time.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests that carry neither a matching `x-api-key` nor a matching bearer token.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // No PSK configured: auth disabled
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let headers = request.headers();
    let api_key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    let verdict = match (api_key, bearer) {
        (Some(key), _) => key_matches(key, &expected).then_some(()).ok_or("Invalid API key"),
        (None, Some(token)) => key_matches(token, &expected)
            .then_some(())
            .ok_or("Missing or invalid API key"),
        (None, None) => Err("Missing or invalid API key"),
    };

    match verdict {
        Ok(()) => next.run(request).await,
        Err(message) => {
            tracing::warn!("Rejected unauthenticated request to {}", request.uri().path());
            AppError::Unauthorized(message.to_string()).into_response()
        }
    }
}

fn key_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_equal() {
        assert!(key_matches("bridge-key-1", "bridge-key-1"));
    }

    #[test]
    fn test_key_matches_not_equal() {
        assert!(!key_matches("bridge-key-1", "bridge-key-2"));
        assert!(!key_matches("short", "much-longer-key"));
    }

    #[test]
    fn test_key_matches_empty() {
        assert!(key_matches("", ""));
        assert!(!key_matches("", "not-empty"));
    }
}
