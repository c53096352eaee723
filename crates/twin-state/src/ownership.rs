//! Ownership transfer records.

use serde::{Deserialize, Serialize};

use twin_core::{Principal, ProductId, Timestamp};

use crate::store::{Transaction, Write};

/// One completed transfer of a product between owners.
///
/// `sequence` counts transfers per product starting at 1. Records are never
/// overwritten: two transfers in the same second get distinct sequences and
/// both stay retrievable, while the timestamp lookup resolves to the later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub product_id: ProductId,
    pub sequence: u64,
    pub previous_owner: Principal,
    pub new_owner: Principal,
    pub reason: String,
    pub timestamp: Timestamp,
}

impl Transaction<'_> {
    /// Stage a transfer record at the product's next transfer sequence.
    pub(crate) fn record_transfer(
        &mut self,
        product_id: &ProductId,
        previous_owner: Principal,
        new_owner: Principal,
        reason: String,
        now: Timestamp,
    ) -> u64 {
        let sequence = self.transfer_count(product_id) + 1;
        self.stage(Write::PutOwnership {
            record: OwnershipRecord {
                product_id: product_id.clone(),
                sequence,
                previous_owner,
                new_owner,
                reason,
                timestamp: now,
            },
        });
        self.stage(Write::SetTransferCount {
            product_id: product_id.clone(),
            count: sequence,
        });
        sequence
    }
}
