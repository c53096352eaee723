//! # Caller Identity Middleware
//!
//! Authenticates mutating requests and hands the registry the caller's
//! [`Principal`]. Read routes are mounted outside this middleware.
//!
//! ## Token Format
//!
//! ```text
//! Authorization: Bearer {principal}:{secret}
//! ```
//!
//! The secret is compared in constant time against `AUTH_TOKEN`. The
//! principal is everything before the last `:`, so principals may contain
//! colons themselves (`did:key:z6Mk...:secret`).
//!
//! When `AUTH_TOKEN` is unset (development), the principal is taken verbatim
//! from the `X-Principal` header instead.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use twin_core::Principal;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Development-mode header carrying the caller's principal.
pub const PRINCIPAL_HEADER: &str = "x-principal";

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated caller, injected into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub principal: Principal,
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of secrets.
///
/// When lengths differ, performs a dummy comparison so the rejection takes
/// the same path as a same-length mismatch.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{principal}:{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let (principal, secret) = provided
        .rsplit_once(':')
        .ok_or_else(|| "invalid token format, expected {principal}:{secret}".to_string())?;

    if !constant_time_token_eq(secret, expected_secret) {
        return Err("invalid bearer token".into());
    }

    let principal = Principal::new(principal).map_err(|e| e.to_string())?;
    Ok(CallerIdentity { principal })
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Resolve the caller and inject a [`CallerIdentity`] into request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let identity = match expected_token {
        Some(expected) => bearer_identity(&request, &expected),
        None => header_identity(&request),
    };

    match identity {
        Ok(identity) => {
            tracing::debug!(principal = %identity.principal, "caller identified");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            unauthorized_response(&msg)
        }
    }
}

fn bearer_identity(request: &Request, expected: &str) -> Result<CallerIdentity, String> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing authorization header".to_string())?;

    let provided = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| "authorization header must use Bearer scheme".to_string())?;

    parse_bearer_token(provided, expected)
}

fn header_identity(request: &Request) -> Result<CallerIdentity, String> {
    let raw = request
        .headers()
        .get(PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing X-Principal header".to_string())?;
    let principal = Principal::new(raw).map_err(|e| e.to_string())?;
    Ok(CallerIdentity { principal })
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// A router that echoes the resolved principal.
    fn test_app(token: Option<String>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|caller: CallerIdentity| async move { caller.principal.to_string() }),
            )
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig { token }))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_bearer_token_yields_principal() {
        let request = Request::builder()
            .uri("/whoami")
            .header("Authorization", "Bearer alice:s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(Some("s3cret".into())), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn principal_may_contain_colons() {
        let request = Request::builder()
            .uri("/whoami")
            .header("Authorization", "Bearer did:key:z6MkOwner:s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(Some("s3cret".into())), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "did:key:z6MkOwner");
    }

    #[tokio::test]
    async fn wrong_secret_rejected() {
        let request = Request::builder()
            .uri("/whoami")
            .header("Authorization", "Bearer alice:guess")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(Some("s3cret".into())), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("invalid bearer token"));
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let request = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let (status, body) = send(test_app(Some("s3cret".into())), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let err: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(err["error"]["code"], "UNAUTHORIZED");
        assert!(err["error"]["message"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn non_bearer_scheme_rejected() {
        let request = Request::builder()
            .uri("/whoami")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(Some("s3cret".into())), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Bearer scheme"));
    }

    #[tokio::test]
    async fn x_principal_header_ignored_when_auth_enabled() {
        let request = Request::builder()
            .uri("/whoami")
            .header("X-Principal", "registrar")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(test_app(Some("s3cret".into())), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_disabled_uses_x_principal() {
        let request = Request::builder()
            .uri("/whoami")
            .header("X-Principal", "registrar")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(None), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "registrar");
    }

    #[tokio::test]
    async fn auth_disabled_without_principal_rejected() {
        let request = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let (status, body) = send(test_app(None), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("X-Principal"));
    }

    #[test]
    fn token_without_separator_is_malformed() {
        let err = parse_bearer_token("s3cret", "s3cret").unwrap_err();
        assert!(err.contains("invalid token format"));
    }

    #[test]
    fn blank_principal_rejected() {
        assert!(parse_bearer_token(" :s3cret", "s3cret").is_err());
    }

    #[test]
    fn constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("abc", "abcd"));
        assert!(!constant_time_token_eq("abd", "abc"));
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = AuthConfig {
            token: Some("s3cret".into()),
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
