//! # Route Modules
//!
//! Mutating routes go in [`writes`] and sit behind the caller-identity
//! middleware. Read routes go in [`reads`] and are open.

use axum::Router;

use crate::state::AppState;

pub mod events;
pub mod ownership;
pub mod products;

/// Routes that need a [`CallerIdentity`](crate::auth::CallerIdentity).
pub fn writes() -> Router<AppState> {
    Router::new()
        .merge(products::writes())
        .merge(ownership::writes())
}

/// Unauthenticated query routes.
pub fn reads() -> Router<AppState> {
    Router::new()
        .merge(products::reads())
        .merge(ownership::reads())
        .merge(events::router())
}
