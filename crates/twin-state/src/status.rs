//! # Product Status
//!
//! The five lifecycle statuses a product can carry and the policy that
//! decides which moves between them the service accepts.
//!
//! ```text
//! MANUFACTURED(1)  IN_TRANSIT(2)  DELIVERED(3)  MAINTENANCE(4)  RETIRED(5)
//! ```
//!
//! Under the default [`StatusPolicy::Unrestricted`] any code in `1..=5` may
//! replace any other, including the current one and including a move out of
//! `RETIRED`. [`StatusPolicy::ForwardOnly`] refuses moves to a lower code.

use serde::{Deserialize, Serialize};

// ─── Product Status ──────────────────────────────────────────────────

/// Lifecycle status of a product, carried as a one-byte code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ProductStatus {
    /// Freshly created by the registrar.
    Manufactured = 1,
    /// Moving between custodians.
    InTransit = 2,
    /// Arrived at its destination.
    Delivered = 3,
    /// Out of service for repair or inspection.
    Maintenance = 4,
    /// Withdrawn from service.
    Retired = 5,
}

impl ProductStatus {
    /// Lowest valid status code.
    pub const MIN_CODE: u8 = 1;
    /// Highest valid status code.
    pub const MAX_CODE: u8 = 5;

    /// All statuses in code order.
    pub const ALL: [ProductStatus; 5] = [
        Self::Manufactured,
        Self::InTransit,
        Self::Delivered,
        Self::Maintenance,
        Self::Retired,
    ];

    /// The numeric code (1-5).
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Look up a status by code. `None` outside `1..=5`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Manufactured),
            2 => Some(Self::InTransit),
            3 => Some(Self::Delivered),
            4 => Some(Self::Maintenance),
            5 => Some(Self::Retired),
            _ => None,
        }
    }

    /// Look up a status by a code of any width. `None` outside `1..=5`,
    /// including values that do not fit a `u8`.
    pub fn from_wide_code(code: i64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_code)
    }

    /// The upper-case name used in event payloads and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufactured => "MANUFACTURED",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Maintenance => "MAINTENANCE",
            Self::Retired => "RETIRED",
        }
    }
}

impl TryFrom<u8> for ProductStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl From<ProductStatus> for u8 {
    fn from(status: ProductStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Status Policy ───────────────────────────────────────────────────

/// Which status changes the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Any valid code may follow any other.
    #[default]
    Unrestricted,
    /// A product may stay where it is or move to a higher code, never lower.
    ForwardOnly,
}

impl StatusPolicy {
    /// Whether a move from `from` to `to` is accepted.
    pub fn permits(&self, from: ProductStatus, to: ProductStatus) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::ForwardOnly => to >= from,
        }
    }
}

impl std::fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unrestricted => f.write_str("unrestricted"),
            Self::ForwardOnly => f.write_str("forward_only"),
        }
    }
}

impl std::str::FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "forward_only" => Ok(Self::ForwardOnly),
            other => Err(format!(
                "unknown status policy {other:?}, expected \"unrestricted\" or \"forward_only\""
            )),
        }
    }
}
