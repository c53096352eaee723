//! # Twin Service
//!
//! The public face of the registry. Every mutating operation:
//!
//! 1. opens a transaction on the [`TwinStore`],
//! 2. checks existence and authorization against the staged view,
//! 3. stages the product change, history record and lifecycle event,
//! 4. commits, or returns the error and lets the transaction drop.
//!
//! No operation leaves a product change without its event, or an event
//! without its counter increment. Read accessors are unauthenticated and
//! take only the shared read lock.
//!
//! `now` and `caller` come from the host: the service never reads a clock or
//! authenticates anyone itself. A `now` older than the newest committed
//! event is raised to that event's timestamp, so event time never runs
//! backwards however the host's requests interleave.

use serde::{Deserialize, Serialize};

use twin_core::{Principal, ProductId, Timestamp};

use crate::authorization::{Action, AuthorizationGate};
use crate::error::{RegistryError, StorageError};
use crate::event::{verify_chain, ChainReport, EventDraft, EventId, LifecycleEvent};
use crate::ownership::OwnershipRecord;
use crate::product::{Product, ProductMetadata};
use crate::status::{ProductStatus, StatusPolicy};
use crate::store::{Transaction, TwinStore, Write};

/// Fixed configuration of a [`TwinService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// The only principal allowed to create products. Set once.
    pub registrar: Principal,
    /// Which status changes are accepted.
    #[serde(default)]
    pub status_policy: StatusPolicy,
}

impl ServiceConfig {
    pub fn new(registrar: Principal) -> Self {
        Self {
            registrar,
            status_policy: StatusPolicy::default(),
        }
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }
}

/// Inputs of a maintenance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Cost in the smallest currency unit.
    pub cost: u64,
    pub technician: String,
}

/// The digital twin registry.
#[derive(Debug, Clone)]
pub struct TwinService {
    store: TwinStore,
    gate: AuthorizationGate,
    status_policy: StatusPolicy,
}

impl TwinService {
    /// Bind the service to `store`.
    ///
    /// # Errors
    ///
    /// [`StorageError::RegistrarMismatch`] when the store was created under
    /// another registrar. The registrar is fixed for the life of a registry.
    pub fn new(config: ServiceConfig, store: TwinStore) -> Result<Self, StorageError> {
        store.bind_registrar(&config.registrar)?;
        Ok(Self::assemble(config, store))
    }

    /// A service over a fresh in-memory store.
    pub fn in_memory(config: ServiceConfig) -> Self {
        Self::assemble(config, TwinStore::in_memory())
    }

    fn assemble(config: ServiceConfig, store: TwinStore) -> Self {
        tracing::info!(
            registrar = %config.registrar,
            status_policy = %config.status_policy,
            durable = store.is_durable(),
            "twin service initialised"
        );
        Self {
            store,
            gate: AuthorizationGate::new(config.registrar),
            status_policy: config.status_policy,
        }
    }

    pub fn registrar(&self) -> &Principal {
        self.gate.registrar()
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    pub fn store(&self) -> &TwinStore {
        &self.store
    }

    // ── Registry ─────────────────────────────────────────────────────

    /// Register a new product. Registrar only.
    ///
    /// Inserts the product with status `MANUFACTURED` owned by the registrar
    /// and appends its `MANUFACTURED` event in the same transaction.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` if `caller` is not the registrar, `AlreadyExists` if
    /// the id is taken, `Validation` for bad metadata.
    pub fn create_product(
        &self,
        product_id: ProductId,
        metadata: ProductMetadata,
        caller: &Principal,
        now: Timestamp,
    ) -> Result<ProductId, RegistryError> {
        self.gate.authorize_create(caller).inspect_err(|_| {
            tracing::warn!(
                product_id = %product_id,
                caller = %caller,
                "create rejected: caller is not the registrar"
            );
        })?;

        let mut tx = self.store.begin();
        if tx.product(&product_id).is_some() {
            return Err(RegistryError::AlreadyExists(product_id));
        }
        let now = self.effective_now(&tx, &product_id, now);
        let product = Product::manufacture(product_id.clone(), metadata, caller, now)?;
        tx.stage(Write::PutProduct { product });
        tx.stage(Write::SetEventCount {
            product_id: product_id.clone(),
            count: 0,
        });
        let event_id = tx.append_event(&product_id, EventDraft::manufactured(), caller, now)?;
        self.commit(tx, &product_id)?;

        tracing::info!(product_id = %product_id, caller = %caller, event_id, "product created");
        Ok(product_id)
    }

    pub fn get_product(&self, product_id: &ProductId) -> Option<Product> {
        self.store.read().product(product_id).cloned()
    }

    pub fn product_exists(&self, product_id: &ProductId) -> bool {
        self.store.read().contains(product_id)
    }

    /// All registered product ids, in order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.store.read().product_ids().cloned().collect()
    }

    // ── Ownership ────────────────────────────────────────────────────

    /// Hand a product to `new_owner`. Current owner only.
    ///
    /// Records the transfer in the ownership history, moves `current_owner`
    /// and appends an `OWNERSHIP_TRANSFER` event, all or nothing.
    pub fn transfer_ownership(
        &self,
        product_id: &ProductId,
        new_owner: Principal,
        reason: String,
        caller: &Principal,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let mut tx = self.store.begin();
        let mut product = tx
            .product(product_id)
            .cloned()
            .ok_or_else(|| RegistryError::ProductNotFound(product_id.clone()))?;
        self.authorize(&product, caller, Action::Transfer)?;
        let now = self.effective_now(&tx, product_id, now);

        let previous_owner = product.current_owner.clone();
        let sequence = tx.record_transfer(
            product_id,
            previous_owner.clone(),
            new_owner.clone(),
            reason.clone(),
            now,
        );
        product.transfer_to(new_owner.clone(), now);
        tx.stage(Write::PutProduct { product });
        let event_id = tx.append_event(
            product_id,
            EventDraft::ownership_transfer(&new_owner, reason),
            caller,
            now,
        )?;
        self.commit(tx, product_id)?;

        tracing::info!(
            product_id = %product_id,
            from = %previous_owner,
            to = %new_owner,
            sequence,
            event_id,
            "ownership transferred"
        );
        Ok(())
    }

    /// The transfer recorded at exactly `timestamp`. When several share the
    /// timestamp, the latest.
    pub fn get_ownership_history(
        &self,
        product_id: &ProductId,
        timestamp: Timestamp,
    ) -> Option<OwnershipRecord> {
        self.store.read().ownership_at(product_id, timestamp).cloned()
    }

    pub fn get_ownership_record(
        &self,
        product_id: &ProductId,
        sequence: u64,
    ) -> Option<OwnershipRecord> {
        self.store
            .read()
            .ownership_record(product_id, sequence)
            .cloned()
    }

    pub fn get_transfer_count(&self, product_id: &ProductId) -> u64 {
        self.store.read().transfer_count(product_id)
    }

    /// Every transfer of the product, oldest first.
    pub fn ownership_history(&self, product_id: &ProductId) -> Vec<OwnershipRecord> {
        self.store
            .read()
            .ownership_records(product_id)
            .cloned()
            .collect()
    }

    // ── Status ───────────────────────────────────────────────────────

    /// Set a product's status (code `1..=5`) and location. Current owner only.
    ///
    /// The code is range-checked before anything else, so an out-of-range
    /// code reports `InvalidStatus` even for an unknown product.
    pub fn update_status(
        &self,
        product_id: &ProductId,
        new_status: i64,
        location: Option<String>,
        notes: Option<String>,
        caller: &Principal,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let status = ProductStatus::from_wide_code(new_status)
            .ok_or(RegistryError::InvalidStatus(new_status))?;

        let mut tx = self.store.begin();
        let mut product = tx
            .product(product_id)
            .cloned()
            .ok_or_else(|| RegistryError::ProductNotFound(product_id.clone()))?;
        self.authorize(&product, caller, Action::UpdateStatus)?;
        let now = self.effective_now(&tx, product_id, now);

        let from = product.status;
        if !self.status_policy.permits(from, status) {
            tracing::warn!(
                product_id = %product_id,
                %from,
                to = %status,
                "status transition rejected"
            );
            return Err(RegistryError::TransitionRejected { from, to: status });
        }

        product.set_status(status, location.clone(), now);
        tx.stage(Write::PutProduct { product });
        let event_id = tx.append_event(
            product_id,
            EventDraft::status_update(status, location, notes),
            caller,
            now,
        )?;
        self.commit(tx, product_id)?;

        tracing::info!(product_id = %product_id, %from, to = %status, event_id, "status updated");
        Ok(())
    }

    // ── Maintenance ──────────────────────────────────────────────────

    /// Append a `MAINTENANCE` event. Current owner only. The product record
    /// itself is not modified. Returns the new event's id.
    pub fn add_maintenance_record(
        &self,
        product_id: &ProductId,
        record: MaintenanceRecord,
        caller: &Principal,
        now: Timestamp,
    ) -> Result<EventId, RegistryError> {
        let mut tx = self.store.begin();
        let product = tx
            .product(product_id)
            .ok_or_else(|| RegistryError::ProductNotFound(product_id.clone()))?;
        self.authorize(product, caller, Action::AddMaintenance)?;
        let now = self.effective_now(&tx, product_id, now);

        let draft = EventDraft::maintenance(
            record.description,
            record.location,
            record.cost,
            &record.technician,
        );
        let event_id = tx.append_event(product_id, draft, caller, now)?;
        self.commit(tx, product_id)?;

        tracing::info!(
            product_id = %product_id,
            technician = %record.technician,
            cost = record.cost,
            event_id,
            "maintenance recorded"
        );
        Ok(event_id)
    }

    // ── Event Log ────────────────────────────────────────────────────

    pub fn get_lifecycle_event(
        &self,
        product_id: &ProductId,
        event_id: EventId,
    ) -> Option<LifecycleEvent> {
        self.store.read().event(product_id, event_id).cloned()
    }

    /// Highest event id of the product; 0 for unknown products.
    pub fn get_event_count(&self, product_id: &ProductId) -> u64 {
        self.store.read().event_count(product_id)
    }

    /// Every event of the product in id order.
    pub fn lifecycle_events(&self, product_id: &ProductId) -> Vec<LifecycleEvent> {
        self.store.read().events(product_id).cloned().collect()
    }

    /// Recompute the product's event digest chain.
    pub fn verify_event_chain(&self, product_id: &ProductId) -> Result<ChainReport, RegistryError> {
        let keyspace = self.store.read();
        if !keyspace.contains(product_id) {
            return Err(RegistryError::ProductNotFound(product_id.clone()));
        }
        let events: Vec<LifecycleEvent> = keyspace.events(product_id).cloned().collect();
        let report = verify_chain(product_id, keyspace.event_count(product_id), &events);
        if !report.intact {
            tracing::error!(
                product_id = %product_id,
                first_break = ?report.first_break,
                "event chain verification failed"
            );
        }
        Ok(report)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn authorize(
        &self,
        product: &Product,
        caller: &Principal,
        action: Action,
    ) -> Result<(), RegistryError> {
        self.gate
            .authorize_owner(product, caller, action)
            .inspect_err(|_| {
                tracing::warn!(
                    product_id = %product.product_id,
                    caller = %caller,
                    owner = %product.current_owner,
                    ?action,
                    "operation rejected: caller is not the current owner"
                );
            })
    }

    fn effective_now(
        &self,
        tx: &Transaction<'_>,
        product_id: &ProductId,
        requested: Timestamp,
    ) -> Timestamp {
        let now = tx.effective_now(requested);
        if now != requested {
            tracing::debug!(
                product_id = %product_id,
                %requested,
                effective = %now,
                "host time behind the event log, holding at the latest event"
            );
        }
        now
    }

    fn commit(
        &self,
        tx: Transaction<'_>,
        product_id: &ProductId,
    ) -> Result<(), RegistryError> {
        tx.commit().map(|_| ()).map_err(|e| {
            tracing::error!(
                product_id = %product_id,
                error = %e,
                "commit failed, transaction aborted"
            );
            RegistryError::Storage(e)
        })
    }
}
