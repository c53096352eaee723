//! # twin-api: HTTP Host for the Digital Twin Registry
//!
//! Exposes [`TwinService`](twin_state::TwinService) over Axum.
//!
//! ## API Surface
//!
//! | Prefix                              | Module                  | Auth     |
//! |-------------------------------------|-------------------------|----------|
//! | `POST /v1/products`, `.../{id}/*`   | [`routes::products`]    | required |
//! | `POST /v1/products/{id}/transfer`   | [`routes::ownership`]   | required |
//! | `GET  /v1/products/{id}/ownership*` | [`routes::ownership`]   | open     |
//! | `GET  /v1/products/{id}/events*`    | [`routes::events`]      | open     |
//! | `GET  /openapi.json`                | [`openapi`]             | open     |
//! | `GET  /health/*`                    | this module             | open     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware (write routes only) → Handler
//! ```

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod views;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the application router.
///
/// Write routes are wrapped in [`auth::auth_middleware`]; reads, the OpenAPI
/// document, and health probes are served without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let writes = routes::writes().route_layer(from_fn(auth::auth_middleware));

    let api = Router::new()
        .merge(writes)
        .merge(routes::reads())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The registry is replayed before the listener binds, so
/// a running server is always ready.
async fn readiness() -> &'static str {
    "ready"
}
