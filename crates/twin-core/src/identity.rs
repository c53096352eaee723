//! # Identity Newtypes
//!
//! Identifiers used throughout the registry. Each is a distinct type: a
//! [`Principal`] cannot be passed where a [`ProductId`] is expected.
//!
//! ## Validation
//!
//! Both types validate at construction and again on deserialization
//! (`#[serde(try_from = "String")]`), so a journal or request body can never
//! smuggle in an identifier that `new()` would have rejected.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of a product identifier, in bytes.
pub const MAX_PRODUCT_ID_LEN: usize = 64;

/// Maximum length of a principal, in bytes.
pub const MAX_PRINCIPAL_LEN: usize = 256;

// ---------------------------------------------------------------------------
// ProductId
// ---------------------------------------------------------------------------

/// The unique, immutable key of a product record.
///
/// Any non-empty UTF-8 string of at most [`MAX_PRODUCT_ID_LEN`] bytes.
/// Serial-number-like identifiers (`"P1"`, `"ACME-2026-000451"`) are the
/// common case; the registry attaches no further structure to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Create a product identifier, validating its length.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidProductId`] if the value is empty
    /// or longer than [`MAX_PRODUCT_ID_LEN`] bytes.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || s.len() > MAX_PRODUCT_ID_LEN {
            return Err(ValidationError::InvalidProductId {
                len: s.len(),
                value: s,
                max: MAX_PRODUCT_ID_LEN,
            });
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// An opaque, comparable caller identity.
///
/// Principals are authenticated by the host before the core sees them. The
/// core only compares them for equality (registrar check, current-owner
/// check) and records them on products, ownership records and events.
///
/// The display form is the raw string; it is what lands in the
/// `additional_data` of an ownership-transfer event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Create a principal, rejecting blank or oversized values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPrincipal`] if the value is blank
    /// or longer than [`MAX_PRINCIPAL_LEN`] bytes.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() || s.len() > MAX_PRINCIPAL_LEN {
            return Err(ValidationError::InvalidPrincipal(s));
        }
        Ok(Self(s))
    }

    /// Access the principal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
