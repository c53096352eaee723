//! # Product Record
//!
//! The registry entry for one digital twin. Identity, manufacturer,
//! manufacture date, creation time and certification are fixed when the
//! record is created; owner, status, location and `updated_at` move with
//! the product's lifecycle.

use serde::{Deserialize, Serialize};

use twin_core::{Principal, ProductId, Timestamp, ValidationError};

use crate::status::ProductStatus;

/// Maximum number of entries in [`ProductMetadata::materials`].
pub const MAX_MATERIALS: usize = 10;

/// One warranty month, in seconds (an average Gregorian month).
pub const SECONDS_PER_WARRANTY_MONTH: i64 = 2_629_746;

/// Physical dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    /// Length in mm.
    pub length: u32,
    /// Width in mm.
    pub width: u32,
    /// Height in mm.
    pub height: u32,
}

/// Caller-supplied descriptive attributes for a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    /// Human-readable product name.
    pub name: String,
    /// Production batch.
    pub batch_number: String,
    /// Model designation.
    pub model: String,
    /// Manufacturer serial number.
    pub serial_number: String,
    /// Constituent materials, at most [`MAX_MATERIALS`].
    #[serde(default)]
    pub materials: Vec<String>,
    /// Weight in grams.
    pub weight: u64,
    /// Physical dimensions.
    pub dimensions: Dimensions,
    /// Initial location, if known.
    #[serde(default)]
    pub location: Option<String>,
    /// Certification reference. Immutable once the product exists.
    #[serde(default)]
    pub certification: Option<String>,
    /// Warranty length in months, counted from creation.
    #[serde(default)]
    pub warranty_months: u32,
}

impl ProductMetadata {
    /// Check the bounds the registry enforces on metadata.
    ///
    /// # Errors
    ///
    /// [`ValidationError::TooManyMaterials`] if more than [`MAX_MATERIALS`]
    /// materials are listed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.materials.len() > MAX_MATERIALS {
            return Err(ValidationError::TooManyMaterials {
                count: self.materials.len(),
                max: MAX_MATERIALS,
            });
        }
        Ok(())
    }

    /// Warranty expiry for a product created at `created_at`.
    pub fn warranty_expiry(&self, created_at: Timestamp) -> Result<Timestamp, ValidationError> {
        let secs = i64::from(self.warranty_months) * SECONDS_PER_WARRANTY_MONTH;
        created_at.checked_add_secs(secs)
    }
}

/// A registered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub manufacturer: Principal,
    pub manufacture_date: Timestamp,
    pub batch_number: String,
    pub model: String,
    pub serial_number: String,
    pub materials: Vec<String>,
    pub weight: u64,
    pub dimensions: Dimensions,
    pub current_owner: Principal,
    pub status: ProductStatus,
    pub location: Option<String>,
    pub certification: Option<String>,
    pub warranty_expiry: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    /// Build the record for a freshly manufactured product.
    ///
    /// The registrar becomes both manufacturer and first owner, status is
    /// `MANUFACTURED`, and every timestamp is `now`.
    pub fn manufacture(
        product_id: ProductId,
        metadata: ProductMetadata,
        registrar: &Principal,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        metadata.validate()?;
        let warranty_expiry = metadata.warranty_expiry(now)?;
        Ok(Self {
            product_id,
            name: metadata.name,
            manufacturer: registrar.clone(),
            manufacture_date: now,
            batch_number: metadata.batch_number,
            model: metadata.model,
            serial_number: metadata.serial_number,
            materials: metadata.materials,
            weight: metadata.weight,
            dimensions: metadata.dimensions,
            current_owner: registrar.clone(),
            status: ProductStatus::Manufactured,
            location: metadata.location,
            certification: metadata.certification,
            warranty_expiry,
            created_at: now,
            updated_at: now,
        })
    }

    /// Hand the product to `new_owner`.
    pub(crate) fn transfer_to(&mut self, new_owner: Principal, now: Timestamp) {
        self.current_owner = new_owner;
        self.updated_at = now;
    }

    /// Replace status and location. A `None` location clears the old one.
    pub(crate) fn set_status(
        &mut self,
        status: ProductStatus,
        location: Option<String>,
        now: Timestamp,
    ) {
        self.status = status;
        self.location = location;
        self.updated_at = now;
    }

    /// Whether the warranty is still running at `at`.
    pub fn under_warranty(&self, at: Timestamp) -> bool {
        at < self.warranty_expiry
    }
}
