use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

/// API-key guard for the administrative routes.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Keys accepted in `Authorization: Bearer <key>`. Empty = no auth required.
    pub api_keys: Vec<String>,
}

impl AuthConfig {
    /// Guard accepting any of `api_keys`.
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: api_keys.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    /// Returns true if authentication is enabled (at least one key configured).
    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Whether `candidate` matches one of the configured keys.
    pub fn accepts(&self, candidate: &str) -> bool {
        self.api_keys
            .iter()
            .any(|key| constant_time_eq(key.as_bytes(), candidate.as_bytes()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Rejects requests without a valid bearer key when auth is enabled.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(request).await;
    }

    let key = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match key {
        Some(k) if auth.accepts(k) => next.run(request).await,
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected request: invalid API key");
            unauthorized("Invalid API key")
        }
        None => {
            warn!(path = %request.uri().path(), "Rejected request: missing API key");
            unauthorized("API key required")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_disabled() {
        let config = AuthConfig::new(vec![]);
        assert!(!config.is_enabled());
        let config = AuthConfig::new(vec![String::new()]);
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_auth_config_accepts_only_configured_keys() {
        let config = AuthConfig::new(vec!["key123".to_string(), "other".to_string()]);
        assert!(config.is_enabled());
        assert!(config.accepts("key123"));
        assert!(config.accepts("other"));
        assert!(!config.accepts("key12"));
        assert!(!config.accepts("key1234"));
    }
}
