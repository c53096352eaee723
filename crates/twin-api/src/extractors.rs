//! # Extractors & Validation
//!
//! The [`Validate`] trait for request DTOs, JSON body helpers, and the
//! path-segment parser shared by every product route.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use twin_core::ProductId;

use crate::error::AppError;

/// Request types that check rules beyond what serde enforces.
pub trait Validate {
    /// Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Parse the `{id}` path segment.
pub fn product_id(raw: String) -> Result<ProductId, AppError> {
    Ok(ProductId::new(raw)?)
}
