//! # twin-state: Digital Twin Registry Core
//!
//! The state-transition and authorization core of the registry. Hosts (the
//! HTTP API, the CLI, tests) supply the caller's [`Principal`] and the
//! current [`Timestamp`]; this crate decides what changes.
//!
//! ## Components
//!
//! - **Registry** (`product.rs`, [`TwinService::create_product`]): one
//!   [`Product`] per id, created by the registrar only.
//!
//! - **Status** (`status.rs`): the five [`ProductStatus`] codes and the
//!   [`StatusPolicy`] that gates moves between them.
//!
//! - **History Log** (`ownership.rs`): an [`OwnershipRecord`] per transfer,
//!   keyed by a per-product sequence and indexed by timestamp.
//!
//! - **Event Log** (`event.rs`): a contiguous, digest-chained sequence of
//!   [`LifecycleEvent`]s per product.
//!
//! - **Authorization Gate** (`authorization.rs`): registrar-only creation,
//!   current-owner-only everything else.
//!
//! - **Store** (`store.rs`, `journal.rs`): the keyspace, its all-or-nothing
//!   [`Transaction`], and the JSON-lines [`Journal`] that makes it durable.
//!
//! - **Service** (`service.rs`): [`TwinService`], the operations above bound
//!   into single transactions.
//!
//! [`Principal`]: twin_core::Principal
//! [`Timestamp`]: twin_core::Timestamp

pub mod authorization;
pub mod error;
pub mod event;
pub mod journal;
pub mod ownership;
pub mod product;
pub mod service;
pub mod status;
pub mod store;

pub use authorization::{Action, AuthorizationGate};
pub use error::{RegistryError, StorageError};
pub use event::{
    ChainBreak, ChainReport, EventDraft, EventId, EventType, LifecycleEvent,
    DEFAULT_STATUS_NOTE, MANUFACTURED_DESCRIPTION,
};
pub use journal::Journal;
pub use ownership::OwnershipRecord;
pub use product::{
    Dimensions, Product, ProductMetadata, MAX_MATERIALS, SECONDS_PER_WARRANTY_MONTH,
};
pub use service::{MaintenanceRecord, ServiceConfig, TwinService};
pub use status::{ProductStatus, StatusPolicy};
pub use store::{Keyspace, Transaction, TwinStore, Write};
