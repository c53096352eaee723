//! # Lifecycle Events
//!
//! An append-only, per-product log. Event ids start at 1 and grow by exactly
//! one per event; the per-product counter always equals the highest id.
//!
//! Events are chained: each one stores the digest of its predecessor and a
//! digest over its own canonical form, so an edited or dropped event shows
//! up as a broken link in [`ChainReport`].

use serde::{Deserialize, Serialize};

use twin_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, Principal, ProductId,
    Timestamp,
};

use crate::error::StorageError;
use crate::status::ProductStatus;
use crate::store::{Transaction, Write};

/// Description of the event appended when a product is created.
pub const MANUFACTURED_DESCRIPTION: &str = "Product created and manufactured";

/// Description of a status event when the caller gave no notes.
pub const DEFAULT_STATUS_NOTE: &str = "Status updated";

/// Per-product event sequence number.
pub type EventId = u64;

// ─── Event Type ──────────────────────────────────────────────────────

/// Closed vocabulary of lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Manufactured,
    OwnershipTransfer,
    StatusUpdate,
    Maintenance,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufactured => "MANUFACTURED",
            Self::OwnershipTransfer => "OWNERSHIP_TRANSFER",
            Self::StatusUpdate => "STATUS_UPDATE",
            Self::Maintenance => "MAINTENANCE",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Payload Templates ───────────────────────────────────────────────

/// `additional_data` of an ownership transfer.
pub fn transfer_data(new_owner: &Principal) -> String {
    format!("New owner: {new_owner}")
}

/// `additional_data` of a status update.
pub fn status_data(status: ProductStatus) -> String {
    format!("New status: {status}")
}

/// `additional_data` of a maintenance record.
pub fn maintenance_data(cost: u64, technician: &str) -> String {
    format!("Cost: {cost}, Technician: {technician}")
}

// ─── Events ──────────────────────────────────────────────────────────

/// The caller-controlled part of an event, before it is numbered and sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub event_type: EventType,
    pub description: String,
    pub location: Option<String>,
    pub additional_data: Option<String>,
}

impl EventDraft {
    /// The event recorded alongside product creation.
    pub fn manufactured() -> Self {
        Self {
            event_type: EventType::Manufactured,
            description: MANUFACTURED_DESCRIPTION.to_string(),
            location: None,
            additional_data: None,
        }
    }

    /// The event recorded alongside an ownership transfer.
    pub fn ownership_transfer(new_owner: &Principal, reason: String) -> Self {
        Self {
            event_type: EventType::OwnershipTransfer,
            description: reason,
            location: None,
            additional_data: Some(transfer_data(new_owner)),
        }
    }

    /// The event recorded alongside a status change.
    pub fn status_update(
        status: ProductStatus,
        location: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            event_type: EventType::StatusUpdate,
            description: notes.unwrap_or_else(|| DEFAULT_STATUS_NOTE.to_string()),
            location,
            additional_data: Some(status_data(status)),
        }
    }

    /// A maintenance record. The product itself is untouched.
    pub fn maintenance(
        description: String,
        location: Option<String>,
        cost: u64,
        technician: &str,
    ) -> Self {
        Self {
            event_type: EventType::Maintenance,
            description,
            location,
            additional_data: Some(maintenance_data(cost, technician)),
        }
    }
}

/// A sealed, immutable entry in a product's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub product_id: ProductId,
    pub event_id: EventId,
    pub event_type: EventType,
    pub description: String,
    pub location: Option<String>,
    pub timestamp: Timestamp,
    pub recorded_by: Principal,
    pub additional_data: Option<String>,
    /// Digest of event `event_id - 1`, or genesis for the first event.
    pub previous_digest: ContentDigest,
    /// Digest over every field above.
    pub digest: ContentDigest,
}

/// The digested view of an event: everything except `digest` itself.
#[derive(Serialize)]
struct DigestInput<'a> {
    product_id: &'a ProductId,
    event_id: EventId,
    event_type: EventType,
    description: &'a str,
    location: Option<&'a str>,
    timestamp: Timestamp,
    recorded_by: &'a Principal,
    additional_data: Option<&'a str>,
    previous_digest: &'a ContentDigest,
}

impl LifecycleEvent {
    /// Number and seal a draft.
    pub(crate) fn seal(
        product_id: ProductId,
        event_id: EventId,
        draft: EventDraft,
        recorded_by: Principal,
        timestamp: Timestamp,
        previous_digest: ContentDigest,
    ) -> Result<Self, CanonicalizationError> {
        let mut event = Self {
            product_id,
            event_id,
            event_type: draft.event_type,
            description: draft.description,
            location: draft.location,
            timestamp,
            recorded_by,
            additional_data: draft.additional_data,
            previous_digest,
            digest: ContentDigest::GENESIS,
        };
        event.digest = event.compute_digest()?;
        Ok(event)
    }

    /// Recompute the digest from the event's current contents.
    pub fn compute_digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        let input = DigestInput {
            product_id: &self.product_id,
            event_id: self.event_id,
            event_type: self.event_type,
            description: &self.description,
            location: self.location.as_deref(),
            timestamp: self.timestamp,
            recorded_by: &self.recorded_by,
            additional_data: self.additional_data.as_deref(),
            previous_digest: &self.previous_digest,
        };
        Ok(sha256_digest(&CanonicalBytes::new(&input)?))
    }
}

// ─── Append ──────────────────────────────────────────────────────────

impl Transaction<'_> {
    /// Append an event to a product's log inside this transaction.
    ///
    /// Reads the counter (0 when absent), seals the draft at `counter + 1`
    /// chained to the current head, and stages both the event and the new
    /// counter. The event is stamped no earlier than the newest event in the
    /// keyspace.
    ///
    /// # Errors
    ///
    /// [`StorageError::MissingPredecessor`] when the counter names an event
    /// that is not stored, or a canonicalization fault while sealing.
    pub(crate) fn append_event(
        &mut self,
        product_id: &ProductId,
        draft: EventDraft,
        recorded_by: &Principal,
        now: Timestamp,
    ) -> Result<EventId, StorageError> {
        let count = self.event_count(product_id);
        let next = count + 1;
        let previous_digest = match count {
            0 => ContentDigest::GENESIS,
            n => self
                .event(product_id, n)
                .map(|e| e.digest)
                .ok_or_else(|| StorageError::MissingPredecessor {
                    product_id: product_id.clone(),
                    event_id: n,
                })?,
        };
        let now = self.effective_now(now);
        let event = LifecycleEvent::seal(
            product_id.clone(),
            next,
            draft,
            recorded_by.clone(),
            now,
            previous_digest,
        )?;
        self.stage(Write::PutEvent { event });
        self.stage(Write::SetEventCount {
            product_id: product_id.clone(),
            count: next,
        });
        Ok(next)
    }
}

// ─── Chain Verification ──────────────────────────────────────────────

/// Why a link in the event chain failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainBreak {
    /// An id in `1..=count` has no event.
    MissingEvent,
    /// The stored digest does not match the event's contents.
    DigestMismatch,
    /// `previous_digest` does not match the preceding event's digest.
    BrokenLink,
}

/// Outcome of walking one product's event chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub product_id: ProductId,
    /// Events examined before stopping.
    pub events_checked: u64,
    /// The product's event counter.
    pub event_count: u64,
    pub intact: bool,
    /// First event id that failed, with the reason.
    pub first_break: Option<(EventId, ChainBreak)>,
    /// Digest of the last verified event; genesis when none verified.
    pub head: ContentDigest,
}

/// Walk `events` (expected in id order, ids `1..=event_count`) and report
/// the first failure.
pub fn verify_chain(
    product_id: &ProductId,
    event_count: u64,
    events: &[LifecycleEvent],
) -> ChainReport {
    let mut head = ContentDigest::GENESIS;
    let mut checked = 0u64;
    let mut first_break = None;

    for expected_id in 1..=event_count {
        let event = match events.get((expected_id - 1) as usize) {
            Some(e) if e.event_id == expected_id => e,
            _ => {
                first_break = Some((expected_id, ChainBreak::MissingEvent));
                break;
            }
        };
        checked += 1;
        if event.previous_digest != head {
            first_break = Some((expected_id, ChainBreak::BrokenLink));
            break;
        }
        match event.compute_digest() {
            Ok(d) if d == event.digest => head = d,
            _ => {
                first_break = Some((expected_id, ChainBreak::DigestMismatch));
                break;
            }
        }
    }

    ChainReport {
        product_id: product_id.clone(),
        events_checked: checked,
        event_count,
        intact: first_break.is_none(),
        first_break,
        head,
    }
}
