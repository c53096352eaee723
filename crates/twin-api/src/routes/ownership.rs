//! # Ownership Routes
//!
//! Routes:
//! - POST   /v1/products/{id}/transfer                       Transfer ownership (owner only)
//! - GET    /v1/products/{id}/ownership?timestamp=...        Record at an exact timestamp
//! - GET    /v1/products/{id}/ownership/records              Full transfer history
//! - GET    /v1/products/{id}/ownership/records/{sequence}   One record by sequence

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use twin_core::{Principal, Timestamp};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, product_id, Validate};
use crate::routes::products::fetch_product;
use crate::state::AppState;
use crate::views::{OwnershipRecordView, ProductView};

/// Hand a product to a new owner.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub new_owner: String,
    pub reason: String,
}

impl Validate for TransferRequest {
    fn validate(&self) -> Result<(), String> {
        if self.new_owner.trim().is_empty() {
            return Err("new_owner must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnershipQuery {
    /// RFC 3339 instant; must equal a transfer's timestamp to the second.
    pub timestamp: String,
}

pub(crate) fn writes() -> Router<AppState> {
    Router::new().route("/v1/products/{id}/transfer", post(transfer_ownership))
}

pub(crate) fn reads() -> Router<AppState> {
    Router::new()
        .route("/v1/products/{id}/ownership", get(ownership_at))
        .route("/v1/products/{id}/ownership/records", get(list_records))
        .route(
            "/v1/products/{id}/ownership/records/{sequence}",
            get(get_record),
        )
}

/// POST /v1/products/{id}/transfer
#[utoipa::path(
    post,
    path = "/v1/products/{id}/transfer",
    params(("id" = String, Path, description = "Product ID")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Ownership transferred", body = ProductView),
        (status = 403, description = "Caller is not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "ownership"
)]
pub(crate) async fn transfer_ownership(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: CallerIdentity,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<ProductView>, AppError> {
    let id = product_id(id)?;
    let req = extract_validated_json(body)?;
    let new_owner = Principal::new(req.new_owner)?;
    state.service.transfer_ownership(
        &id,
        new_owner,
        req.reason,
        &caller.principal,
        state.now(),
    )?;
    let product = fetch_product(&state, &id)?;
    Ok(Json(ProductView::from(&product)))
}

/// GET /v1/products/{id}/ownership
#[utoipa::path(
    get,
    path = "/v1/products/{id}/ownership",
    params(("id" = String, Path, description = "Product ID"), OwnershipQuery),
    responses(
        (status = 200, description = "Transfer recorded at that instant", body = OwnershipRecordView),
        (status = 400, description = "Missing or malformed timestamp", body = crate::error::ErrorBody),
        (status = 404, description = "No product or no transfer at that instant", body = crate::error::ErrorBody),
    ),
    tag = "ownership"
)]
pub(crate) async fn ownership_at(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<OwnershipQuery>, QueryRejection>,
) -> Result<Json<OwnershipRecordView>, AppError> {
    let id = product_id(id)?;
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let at = Timestamp::parse_lenient(&query.timestamp)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    fetch_product(&state, &id)?;
    state
        .service
        .get_ownership_history(&id, at)
        .map(|record| Json(OwnershipRecordView::from(&record)))
        .ok_or_else(|| AppError::NotFound(format!("no ownership record for {id} at {at}")))
}

/// GET /v1/products/{id}/ownership/records
#[utoipa::path(
    get,
    path = "/v1/products/{id}/ownership/records",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Transfers in sequence order", body = Vec<OwnershipRecordView>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "ownership"
)]
pub(crate) async fn list_records(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OwnershipRecordView>>, AppError> {
    let id = product_id(id)?;
    fetch_product(&state, &id)?;
    let records = state
        .service
        .ownership_history(&id)
        .iter()
        .map(OwnershipRecordView::from)
        .collect();
    Ok(Json(records))
}

/// GET /v1/products/{id}/ownership/records/{sequence}
#[utoipa::path(
    get,
    path = "/v1/products/{id}/ownership/records/{sequence}",
    params(
        ("id" = String, Path, description = "Product ID"),
        ("sequence" = u64, Path, description = "Transfer sequence, starting at 1"),
    ),
    responses(
        (status = 200, description = "Transfer record", body = OwnershipRecordView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "ownership"
)]
pub(crate) async fn get_record(
    State(state): State<AppState>,
    Path((id, sequence)): Path<(String, u64)>,
) -> Result<Json<OwnershipRecordView>, AppError> {
    let id = product_id(id)?;
    state
        .service
        .get_ownership_record(&id, sequence)
        .map(|record| Json(OwnershipRecordView::from(&record)))
        .ok_or_else(|| AppError::NotFound(format!("ownership record {sequence} for {id}")))
}
