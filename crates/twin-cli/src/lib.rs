//! # twin-cli: Journal Inspection Tool
//!
//! The `twin` binary reads a registry journal without opening it for
//! writing, so it is safe to point at the journal of a running server.
//!
//! ## Subcommands
//!
//! - `twin --journal <path> product <id>`: current product record as JSON.
//! - `twin --journal <path> events <id>`: lifecycle events as JSON.
//! - `twin --journal <path> history <id>`: ownership transfers as JSON.
//! - `twin --journal <path> verify [<id>]`: recompute event digest chains.
//!
//! Exit codes: 0 on success, 1 on operational error, 2 when `verify` finds
//! a broken chain.

pub mod inspect;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};

use twin_core::ProductId;
use twin_state::TwinStore;

/// Replay the journal at `path` into a read-only store.
pub fn load_journal(path: &Path) -> Result<TwinStore> {
    if !path.exists() {
        anyhow::bail!("journal not found: {}", path.display());
    }
    let store = TwinStore::load(path)
        .with_context(|| format!("failed to replay journal: {}", path.display()))?;
    tracing::info!(
        journal = %path.display(),
        products = store.read().product_count(),
        "journal loaded"
    );
    Ok(store)
}

/// Parse a product id given on the command line.
pub fn parse_product_id(raw: &str) -> Result<ProductId> {
    ProductId::new(raw).with_context(|| format!("invalid product id {raw:?}"))
}
