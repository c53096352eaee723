//! # Authorization Gate
//!
//! Two rules. Creation requires the registrar. Transfer, status update and
//! maintenance require the product's current owner at the time of the call;
//! the registrar has no standing once ownership has moved on.
//!
//! Callers arrive already authenticated. The gate only compares principals.

use serde::{Deserialize, Serialize};

use twin_core::Principal;

use crate::error::RegistryError;
use crate::product::Product;

/// A gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Transfer,
    UpdateStatus,
    AddMaintenance,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create products",
            Self::Transfer => "transfer this product",
            Self::UpdateStatus => "update this product's status",
            Self::AddMaintenance => "record maintenance on this product",
        };
        f.write_str(s)
    }
}

/// Holds the registrar identity and applies the two authorization rules.
///
/// The registrar is fixed at construction. There is no setter.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    registrar: Principal,
}

impl AuthorizationGate {
    pub fn new(registrar: Principal) -> Self {
        Self { registrar }
    }

    pub fn registrar(&self) -> &Principal {
        &self.registrar
    }

    /// Only the registrar may create products.
    pub fn authorize_create(&self, caller: &Principal) -> Result<(), RegistryError> {
        if caller == &self.registrar {
            Ok(())
        } else {
            Err(RegistryError::NotAuthorized {
                caller: caller.clone(),
                action: Action::Create,
            })
        }
    }

    /// Only the current owner may act on an existing product.
    pub fn authorize_owner(
        &self,
        product: &Product,
        caller: &Principal,
        action: Action,
    ) -> Result<(), RegistryError> {
        if caller == &product.current_owner {
            Ok(())
        } else {
            Err(RegistryError::NotAuthorized {
                caller: caller.clone(),
                action,
            })
        }
    }
}
