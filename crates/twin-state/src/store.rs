//! # Transactional Keyspace
//!
//! One logical keyspace holds products, ownership records, per-product
//! transfer counters, lifecycle events and per-product event counters.
//!
//! Every mutating operation runs inside a [`Transaction`]:
//!
//! 1. [`TwinStore::begin`] takes the write lock. Operations are serialized.
//! 2. Writes are staged in a private overlay; reads through the transaction
//!    see them, readers outside it do not.
//! 3. [`Transaction::commit`] appends the write-set to the journal (when one
//!    is attached) and only then applies it to the keyspace.
//! 4. Dropping the transaction without committing discards the overlay.
//!
//! A failed journal append therefore leaves the keyspace exactly as it was.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use twin_core::{Principal, ProductId, Timestamp};

use crate::error::StorageError;
use crate::event::{EventId, LifecycleEvent};
use crate::journal::Journal;
use crate::ownership::OwnershipRecord;
use crate::product::Product;

// ─── Writes ──────────────────────────────────────────────────────────

/// A single keyspace mutation. A committed write-set is a `Vec<Write>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Write {
    PutProduct {
        product: Product,
    },
    /// Also points the `(product_id, timestamp)` index at this record.
    PutOwnership {
        record: OwnershipRecord,
    },
    SetTransferCount {
        product_id: ProductId,
        count: u64,
    },
    PutEvent {
        event: LifecycleEvent,
    },
    SetEventCount {
        product_id: ProductId,
        count: u64,
    },
    /// Pins the registrar the keyspace was created under.
    SetRegistrar {
        registrar: Principal,
    },
}

// ─── Keyspace ────────────────────────────────────────────────────────

/// The registry's full state.
#[derive(Debug, Default)]
pub struct Keyspace {
    products: BTreeMap<ProductId, Product>,
    ownership: BTreeMap<(ProductId, u64), OwnershipRecord>,
    ownership_by_time: BTreeMap<(ProductId, Timestamp), u64>,
    transfer_counts: BTreeMap<ProductId, u64>,
    events: BTreeMap<(ProductId, EventId), LifecycleEvent>,
    event_counts: BTreeMap<ProductId, u64>,
    latest_event_at: Option<Timestamp>,
    registrar: Option<Principal>,
}

impl Keyspace {
    fn apply(&mut self, write: Write) {
        match write {
            Write::PutProduct { product } => {
                self.products.insert(product.product_id.clone(), product);
            }
            Write::PutOwnership { record } => {
                self.ownership_by_time.insert(
                    (record.product_id.clone(), record.timestamp),
                    record.sequence,
                );
                self.ownership
                    .insert((record.product_id.clone(), record.sequence), record);
            }
            Write::SetTransferCount { product_id, count } => {
                self.transfer_counts.insert(product_id, count);
            }
            Write::PutEvent { event } => {
                self.latest_event_at = self.latest_event_at.max(Some(event.timestamp));
                self.events
                    .insert((event.product_id.clone(), event.event_id), event);
            }
            Write::SetEventCount { product_id, count } => {
                self.event_counts.insert(product_id, count);
            }
            Write::SetRegistrar { registrar } => {
                self.registrar = Some(registrar);
            }
        }
    }

    pub fn product(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.get(product_id)
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.products.contains_key(product_id)
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.products.keys()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn ownership_record(
        &self,
        product_id: &ProductId,
        sequence: u64,
    ) -> Option<&OwnershipRecord> {
        self.ownership.get(&(product_id.clone(), sequence))
    }

    /// The record indexed at exactly `timestamp`. When several transfers
    /// share the timestamp this is the one with the highest sequence.
    pub fn ownership_at(
        &self,
        product_id: &ProductId,
        timestamp: Timestamp,
    ) -> Option<&OwnershipRecord> {
        let sequence = self
            .ownership_by_time
            .get(&(product_id.clone(), timestamp))?;
        self.ownership_record(product_id, *sequence)
    }

    pub fn ownership_records(
        &self,
        product_id: &ProductId,
    ) -> impl Iterator<Item = &OwnershipRecord> {
        self.ownership
            .range((product_id.clone(), 0)..=(product_id.clone(), u64::MAX))
            .map(|(_, r)| r)
    }

    pub fn transfer_count(&self, product_id: &ProductId) -> u64 {
        self.transfer_counts.get(product_id).copied().unwrap_or(0)
    }

    pub fn event(&self, product_id: &ProductId, event_id: EventId) -> Option<&LifecycleEvent> {
        self.events.get(&(product_id.clone(), event_id))
    }

    /// Highest assigned event id for the product; 0 when it has none.
    pub fn event_count(&self, product_id: &ProductId) -> u64 {
        self.event_counts.get(product_id).copied().unwrap_or(0)
    }

    /// The registrar recorded when the keyspace was first bound.
    pub fn registrar(&self) -> Option<&Principal> {
        self.registrar.as_ref()
    }

    /// Timestamp of the newest event of any product.
    pub fn latest_event_at(&self) -> Option<Timestamp> {
        self.latest_event_at
    }

    pub fn events(&self, product_id: &ProductId) -> impl Iterator<Item = &LifecycleEvent> {
        self.events
            .range((product_id.clone(), 0)..=(product_id.clone(), u64::MAX))
            .map(|(_, e)| e)
    }
}

// ─── Store ───────────────────────────────────────────────────────────

/// Shared handle to the keyspace and its optional journal.
#[derive(Debug, Clone, Default)]
pub struct TwinStore {
    keyspace: Arc<RwLock<Keyspace>>,
    journal: Option<Arc<Mutex<Journal>>>,
}

impl TwinStore {
    /// A volatile store with no journal.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or create) the journal at `path`, replay it, and keep it
    /// attached so every later commit is appended to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let (journal, batches) = Journal::open(path)?;
        let store = Self::from_batches(batches);
        tracing::info!(
            path = %journal.path().display(),
            entries = journal.entries(),
            products = store.read().product_count(),
            "journal replayed"
        );
        Ok(Self {
            journal: Some(Arc::new(Mutex::new(journal))),
            ..store
        })
    }

    /// Replay the journal at `path` into a store with no journal attached.
    ///
    /// Used by read-only tooling; commits against the result are not
    /// persisted.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self::from_batches(Journal::replay(path.as_ref())?))
    }

    fn from_batches(batches: Vec<Vec<Write>>) -> Self {
        let mut keyspace = Keyspace::default();
        for write in batches.into_iter().flatten() {
            keyspace.apply(write);
        }
        Self {
            keyspace: Arc::new(RwLock::new(keyspace)),
            journal: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_journal(journal: Journal) -> Self {
        Self {
            keyspace: Arc::default(),
            journal: Some(Arc::new(Mutex::new(journal))),
        }
    }

    /// Pin `registrar` to this store, or check it against the one already
    /// pinned.
    ///
    /// The first bind records the registrar (in the journal, when one is
    /// attached). Every later bind, including after a restart, must name the
    /// same principal.
    ///
    /// # Errors
    ///
    /// [`StorageError::RegistrarMismatch`] when a different registrar is
    /// recorded, or a journal failure while recording it.
    pub fn bind_registrar(&self, registrar: &Principal) -> Result<(), StorageError> {
        let mut tx = self.begin();
        match tx.base.registrar().cloned() {
            Some(recorded) if &recorded == registrar => Ok(()),
            Some(recorded) => Err(StorageError::RegistrarMismatch {
                recorded,
                configured: registrar.clone(),
            }),
            None => {
                tx.stage(Write::SetRegistrar {
                    registrar: registrar.clone(),
                });
                tx.commit()?;
                tracing::info!(
                    registrar = %registrar,
                    durable = self.is_durable(),
                    "registrar pinned"
                );
                Ok(())
            }
        }
    }

    /// Whether commits are persisted.
    pub fn is_durable(&self) -> bool {
        self.journal.is_some()
    }

    /// Start a transaction. Blocks until no other transaction or reader
    /// holds the keyspace.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            base: self.keyspace.write(),
            journal: self.journal.as_deref(),
            staged: Keyspace::default(),
            writes: Vec::new(),
        }
    }

    /// Shared read access to committed state.
    pub fn read(&self) -> RwLockReadGuard<'_, Keyspace> {
        self.keyspace.read()
    }
}

// ─── Transaction ─────────────────────────────────────────────────────

/// Exclusive, all-or-nothing unit of work over the keyspace.
#[must_use = "a transaction is rolled back unless committed"]
pub struct Transaction<'a> {
    base: RwLockWriteGuard<'a, Keyspace>,
    journal: Option<&'a Mutex<Journal>>,
    staged: Keyspace,
    writes: Vec<Write>,
}

impl Transaction<'_> {
    pub fn product(&self, product_id: &ProductId) -> Option<&Product> {
        self.staged
            .product(product_id)
            .or_else(|| self.base.product(product_id))
    }

    pub fn event(&self, product_id: &ProductId, event_id: EventId) -> Option<&LifecycleEvent> {
        self.staged
            .event(product_id, event_id)
            .or_else(|| self.base.event(product_id, event_id))
    }

    pub fn event_count(&self, product_id: &ProductId) -> u64 {
        self.staged
            .event_counts
            .get(product_id)
            .copied()
            .unwrap_or_else(|| self.base.event_count(product_id))
    }

    pub fn transfer_count(&self, product_id: &ProductId) -> u64 {
        self.staged
            .transfer_counts
            .get(product_id)
            .copied()
            .unwrap_or_else(|| self.base.transfer_count(product_id))
    }

    /// `now`, raised to the newest event timestamp this transaction can
    /// see. Hosts read their clock before the write lock is taken, so a
    /// request that loses the race for it may carry an older time.
    pub fn effective_now(&self, now: Timestamp) -> Timestamp {
        let floor = self.staged.latest_event_at.max(self.base.latest_event_at);
        match floor {
            Some(latest) if latest > now => latest,
            _ => now,
        }
    }

    /// Stage a write. It becomes visible to this transaction immediately and
    /// to everyone else on commit.
    pub fn stage(&mut self, write: Write) {
        self.staged.apply(write.clone());
        self.writes.push(write);
    }

    /// Number of staged writes.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Persist and apply every staged write. Returns how many were applied.
    ///
    /// # Errors
    ///
    /// A journal failure is returned with the keyspace untouched.
    pub fn commit(mut self) -> Result<usize, StorageError> {
        let writes = std::mem::take(&mut self.writes);
        if writes.is_empty() {
            return Ok(0);
        }
        if let Some(journal) = self.journal {
            journal.lock().append(&writes)?;
        }
        let applied = writes.len();
        for write in writes {
            self.base.apply(write);
        }
        Ok(applied)
    }

    /// Discard every staged write.
    pub fn rollback(self) {}
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("pending", &self.writes.len())
            .field("durable", &self.journal.is_some())
            .finish()
    }
}
