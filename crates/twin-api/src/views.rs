//! # Wire Views
//!
//! JSON shapes returned by the API. Each view is built from a registry
//! record; identifiers and timestamps go out as strings, digests as hex.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use twin_state::{ChainReport, Dimensions, LifecycleEvent, OwnershipRecord, Product};

/// Physical dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct DimensionsView {
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for DimensionsView {
    fn from(d: Dimensions) -> Self {
        Self {
            length: d.length,
            width: d.width,
            height: d.height,
        }
    }
}

impl From<DimensionsView> for Dimensions {
    fn from(d: DimensionsView) -> Self {
        Self {
            length: d.length,
            width: d.width,
            height: d.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub product_id: String,
    pub name: String,
    pub manufacturer: String,
    pub manufacture_date: String,
    pub batch_number: String,
    pub model: String,
    pub serial_number: String,
    pub materials: Vec<String>,
    /// Grams.
    pub weight: u64,
    pub dimensions: DimensionsView,
    pub current_owner: String,
    /// Status name, e.g. `IN_TRANSIT`.
    pub status: String,
    /// Status code, 1-5.
    pub status_code: u8,
    pub location: Option<String>,
    pub certification: Option<String>,
    pub warranty_expiry: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            product_id: p.product_id.to_string(),
            name: p.name.clone(),
            manufacturer: p.manufacturer.to_string(),
            manufacture_date: p.manufacture_date.to_iso8601(),
            batch_number: p.batch_number.clone(),
            model: p.model.clone(),
            serial_number: p.serial_number.clone(),
            materials: p.materials.clone(),
            weight: p.weight,
            dimensions: p.dimensions.into(),
            current_owner: p.current_owner.to_string(),
            status: p.status.to_string(),
            status_code: p.status.code(),
            location: p.location.clone(),
            certification: p.certification.clone(),
            warranty_expiry: p.warranty_expiry.to_iso8601(),
            created_at: p.created_at.to_iso8601(),
            updated_at: p.updated_at.to_iso8601(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OwnershipRecordView {
    pub product_id: String,
    pub sequence: u64,
    pub previous_owner: String,
    pub new_owner: String,
    pub reason: String,
    pub timestamp: String,
}

impl From<&OwnershipRecord> for OwnershipRecordView {
    fn from(r: &OwnershipRecord) -> Self {
        Self {
            product_id: r.product_id.to_string(),
            sequence: r.sequence,
            previous_owner: r.previous_owner.to_string(),
            new_owner: r.new_owner.to_string(),
            reason: r.reason.clone(),
            timestamp: r.timestamp.to_iso8601(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LifecycleEventView {
    pub product_id: String,
    pub event_id: u64,
    /// `MANUFACTURED`, `OWNERSHIP_TRANSFER`, `STATUS_UPDATE` or `MAINTENANCE`.
    pub event_type: String,
    pub description: String,
    pub location: Option<String>,
    pub timestamp: String,
    pub recorded_by: String,
    pub additional_data: Option<String>,
    pub previous_digest: String,
    pub digest: String,
}

impl From<&LifecycleEvent> for LifecycleEventView {
    fn from(e: &LifecycleEvent) -> Self {
        Self {
            product_id: e.product_id.to_string(),
            event_id: e.event_id,
            event_type: e.event_type.to_string(),
            description: e.description.clone(),
            location: e.location.clone(),
            timestamp: e.timestamp.to_iso8601(),
            recorded_by: e.recorded_by.to_string(),
            additional_data: e.additional_data.clone(),
            previous_digest: e.previous_digest.to_hex(),
            digest: e.digest.to_hex(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChainReportView {
    pub product_id: String,
    pub event_count: u64,
    pub events_checked: u64,
    pub intact: bool,
    /// First event id that failed verification.
    pub first_broken_event: Option<u64>,
    /// `MISSING_EVENT`, `DIGEST_MISMATCH` or `BROKEN_LINK`.
    pub break_reason: Option<String>,
    /// Digest of the last verified event.
    pub head: String,
}

impl From<&ChainReport> for ChainReportView {
    fn from(r: &ChainReport) -> Self {
        let (first_broken_event, break_reason) = match &r.first_break {
            Some((id, reason)) => (
                Some(*id),
                serde_json::to_value(reason)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string)),
            ),
            None => (None, None),
        };
        Self {
            product_id: r.product_id.to_string(),
            event_count: r.event_count,
            events_checked: r.events_checked,
            intact: r.intact,
            first_broken_event,
            break_reason,
            head: r.head.to_hex(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventCountResponse {
    pub product_id: String,
    pub event_count: u64,
}
