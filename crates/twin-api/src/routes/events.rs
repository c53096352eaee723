//! # Lifecycle Event Routes
//!
//! Routes:
//! - GET    /v1/products/{id}/events               Events in id order
//! - GET    /v1/products/{id}/events/count         Event counter
//! - GET    /v1/products/{id}/events/verify        Walk the digest chain
//! - GET    /v1/products/{id}/events/{event_id}    One event

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppError;
use crate::extractors::product_id;
use crate::state::AppState;
use crate::views::{ChainReportView, EventCountResponse, LifecycleEventView};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/products/{id}/events", get(list_events))
        .route("/v1/products/{id}/events/count", get(event_count))
        .route("/v1/products/{id}/events/verify", get(verify_chain))
        .route("/v1/products/{id}/events/{event_id}", get(get_event))
}

/// GET /v1/products/{id}/events
#[utoipa::path(
    get,
    path = "/v1/products/{id}/events",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Events, empty for an unknown product", body = Vec<LifecycleEventView>),
    ),
    tag = "events"
)]
pub(crate) async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LifecycleEventView>>, AppError> {
    let id = product_id(id)?;
    let events = state
        .service
        .lifecycle_events(&id)
        .iter()
        .map(LifecycleEventView::from)
        .collect();
    Ok(Json(events))
}

/// GET /v1/products/{id}/events/count
#[utoipa::path(
    get,
    path = "/v1/products/{id}/events/count",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Event count, 0 for an unknown product", body = EventCountResponse),
    ),
    tag = "events"
)]
pub(crate) async fn event_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventCountResponse>, AppError> {
    let id = product_id(id)?;
    let event_count = state.service.get_event_count(&id);
    Ok(Json(EventCountResponse {
        product_id: id.to_string(),
        event_count,
    }))
}

/// GET /v1/products/{id}/events/{event_id}
#[utoipa::path(
    get,
    path = "/v1/products/{id}/events/{event_id}",
    params(
        ("id" = String, Path, description = "Product ID"),
        ("event_id" = u64, Path, description = "Event id, starting at 1"),
    ),
    responses(
        (status = 200, description = "Event", body = LifecycleEventView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
pub(crate) async fn get_event(
    State(state): State<AppState>,
    Path((id, event_id)): Path<(String, u64)>,
) -> Result<Json<LifecycleEventView>, AppError> {
    let id = product_id(id)?;
    state
        .service
        .get_lifecycle_event(&id, event_id)
        .map(|event| Json(LifecycleEventView::from(&event)))
        .ok_or_else(|| AppError::NotFound(format!("event {event_id} for {id}")))
}

/// GET /v1/products/{id}/events/verify
#[utoipa::path(
    get,
    path = "/v1/products/{id}/events/verify",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Chain report", body = ChainReportView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
pub(crate) async fn verify_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChainReportView>, AppError> {
    let id = product_id(id)?;
    let report = state.service.verify_event_chain(&id)?;
    Ok(Json(ChainReportView::from(&report)))
}
