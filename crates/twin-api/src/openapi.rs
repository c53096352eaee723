//! # OpenAPI Document
//!
//! Collects the utoipa-annotated handlers into one OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Digital Twin Registry API",
        version = "0.1.0",
        description = "Product registration, ownership transfer, status tracking, and a tamper-evident lifecycle event log."
    ),
    paths(
        // Products
        crate::routes::products::create_product,
        crate::routes::products::get_product,
        crate::routes::products::product_exists,
        crate::routes::products::update_status,
        crate::routes::products::add_maintenance,
        // Ownership
        crate::routes::ownership::transfer_ownership,
        crate::routes::ownership::ownership_at,
        crate::routes::ownership::list_records,
        crate::routes::ownership::get_record,
        // Events
        crate::routes::events::list_events,
        crate::routes::events::event_count,
        crate::routes::events::get_event,
        crate::routes::events::verify_chain,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::products::CreateProductRequest,
        crate::routes::products::UpdateStatusRequest,
        crate::routes::products::MaintenanceRequest,
        crate::routes::ownership::TransferRequest,
        crate::views::ProductView,
        crate::views::DimensionsView,
        crate::views::OwnershipRecordView,
        crate::views::LifecycleEventView,
        crate::views::ChainReportView,
        crate::views::ExistsResponse,
        crate::views::EventCountResponse,
    )),
    tags(
        (name = "products", description = "Product registry"),
        (name = "ownership", description = "Ownership transfers and history"),
        (name = "events", description = "Lifecycle event log"),
    )
)]
pub struct ApiDoc;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
