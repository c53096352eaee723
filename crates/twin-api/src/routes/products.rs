//! # Product Routes
//!
//! Routes:
//! - POST   /v1/products                     Register a product (registrar only)
//! - GET    /v1/products/{id}                Current product record
//! - GET    /v1/products/{id}/exists         Existence check
//! - POST   /v1/products/{id}/status         Change status (owner only)
//! - POST   /v1/products/{id}/maintenance    Log maintenance (owner only)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use twin_core::ProductId;
use twin_state::{MaintenanceRecord, Product, ProductMetadata, RegistryError};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, product_id, Validate};
use crate::state::AppState;
use crate::views::{DimensionsView, EventCountResponse, ExistsResponse, ProductView};

/// Register a new product.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub product_id: String,
    pub name: String,
    pub batch_number: String,
    pub model: String,
    pub serial_number: String,
    /// At most 10 entries.
    #[serde(default)]
    pub materials: Vec<String>,
    /// Grams.
    pub weight: u64,
    #[serde(default)]
    pub dimensions: DimensionsView,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub certification: Option<String>,
    /// Warranty length in months, counted from creation.
    #[serde(default)]
    pub warranty_months: u32,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), String> {
        if self.product_id.trim().is_empty() {
            return Err("product_id must not be empty".to_string());
        }
        Ok(())
    }
}

impl CreateProductRequest {
    fn into_parts(self) -> Result<(ProductId, ProductMetadata), AppError> {
        let id = ProductId::new(self.product_id)?;
        let metadata = ProductMetadata {
            name: self.name,
            batch_number: self.batch_number,
            model: self.model,
            serial_number: self.serial_number,
            materials: self.materials,
            weight: self.weight,
            dimensions: self.dimensions.into(),
            location: self.location,
            certification: self.certification,
            warranty_months: self.warranty_months,
        };
        Ok((id, metadata))
    }
}

/// Change a product's status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Status code, 1 (MANUFACTURED) to 5 (RETIRED). Any other integer is
    /// rejected with `INVALID_STATUS`.
    pub status: i64,
    /// Replaces the stored location; omit to clear it.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Log a maintenance action.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MaintenanceRequest {
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    pub cost: u64,
    pub technician: String,
}

impl From<MaintenanceRequest> for MaintenanceRecord {
    fn from(req: MaintenanceRequest) -> Self {
        Self {
            description: req.description,
            location: req.location,
            cost: req.cost,
            technician: req.technician,
        }
    }
}

pub(crate) fn writes() -> Router<AppState> {
    Router::new()
        .route("/v1/products", post(create_product))
        .route("/v1/products/{id}/status", post(update_status))
        .route("/v1/products/{id}/maintenance", post(add_maintenance))
}

pub(crate) fn reads() -> Router<AppState> {
    Router::new()
        .route("/v1/products/{id}", get(get_product))
        .route("/v1/products/{id}/exists", get(product_exists))
}

/// Load a product or fail with `PRODUCT_NOT_FOUND`.
pub(crate) fn fetch_product(state: &AppState, id: &ProductId) -> Result<Product, AppError> {
    state
        .service
        .get_product(id)
        .ok_or_else(|| RegistryError::ProductNotFound(id.clone()).into())
}

/// POST /v1/products
#[utoipa::path(
    post,
    path = "/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product registered", body = ProductView),
        (status = 403, description = "Caller is not the registrar", body = crate::error::ErrorBody),
        (status = 409, description = "Product id already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid metadata", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn create_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    let req = extract_validated_json(body)?;
    let (id, metadata) = req.into_parts()?;
    let id = state
        .service
        .create_product(id, metadata, &caller.principal, state.now())?;
    let product = fetch_product(&state, &id)?;
    Ok((StatusCode::CREATED, Json(ProductView::from(&product))))
}

/// GET /v1/products/{id}
#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>, AppError> {
    let id = product_id(id)?;
    let product = fetch_product(&state, &id)?;
    Ok(Json(ProductView::from(&product)))
}

/// GET /v1/products/{id}/exists
#[utoipa::path(
    get,
    path = "/v1/products/{id}/exists",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Existence flag", body = ExistsResponse),
    ),
    tag = "products"
)]
pub(crate) async fn product_exists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let id = product_id(id)?;
    Ok(Json(ExistsResponse {
        exists: state.service.product_exists(&id),
    }))
}

/// POST /v1/products/{id}/status
#[utoipa::path(
    post,
    path = "/v1/products/{id}/status",
    params(("id" = String, Path, description = "Product ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ProductView),
        (status = 403, description = "Caller is not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition rejected by policy", body = crate::error::ErrorBody),
        (status = 422, description = "Status code out of range", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: CallerIdentity,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ProductView>, AppError> {
    let id = product_id(id)?;
    let req = extract_json(body)?;
    state.service.update_status(
        &id,
        req.status,
        req.location,
        req.notes,
        &caller.principal,
        state.now(),
    )?;
    let product = fetch_product(&state, &id)?;
    Ok(Json(ProductView::from(&product)))
}

/// POST /v1/products/{id}/maintenance
#[utoipa::path(
    post,
    path = "/v1/products/{id}/maintenance",
    params(("id" = String, Path, description = "Product ID")),
    request_body = MaintenanceRequest,
    responses(
        (status = 201, description = "Maintenance event recorded", body = EventCountResponse),
        (status = 403, description = "Caller is not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub(crate) async fn add_maintenance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: CallerIdentity,
    body: Result<Json<MaintenanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventCountResponse>), AppError> {
    let id = product_id(id)?;
    let req = extract_json(body)?;
    let event_count = state
        .service
        .add_maintenance_record(&id, req.into(), &caller.principal, state.now())?;
    Ok((
        StatusCode::CREATED,
        Json(EventCountResponse {
            product_id: id.to_string(),
            event_count,
        }),
    ))
}
