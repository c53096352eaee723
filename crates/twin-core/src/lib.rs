#![deny(missing_docs)]

//! # twin-core: Foundational Types for the Digital Twin Registry
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** [`ProductId`] and [`Principal`]
//!    validate at construction and on deserialization. You cannot pass a
//!    principal where a product identifier is expected.
//!
//! 2. **UTC-only timestamps.** [`Timestamp`] is seconds-precision UTC, the
//!    granularity the registry keys history on.
//!
//! 3. **Time is a host primitive.** The core never reads the wall clock
//!    directly; hosts hand it a [`Clock`].
//!
//! 4. **[`CanonicalBytes`] is the sole path to digest computation.** Event
//!    chain digests are computed with [`sha256_digest()`], which only accepts
//!    canonical bytes.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod clock;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoreError, ValidationError};
pub use identity::{Principal, ProductId, MAX_PRINCIPAL_LEN, MAX_PRODUCT_ID_LEN};
pub use temporal::Timestamp;
