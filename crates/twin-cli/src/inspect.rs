//! # Inspect Subcommands
//!
//! `product`, `events` and `history` print registry records as pretty JSON.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use twin_core::ProductId;
use twin_state::{Keyspace, LifecycleEvent, OwnershipRecord, TwinStore};

/// Arguments shared by the per-product inspect subcommands.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Product identifier.
    #[arg(value_name = "PRODUCT_ID")]
    pub id: String,
}

/// `twin product <id>`
pub fn run_product(store: &TwinStore, args: &InspectArgs, out: &mut dyn Write) -> Result<u8> {
    let id = crate::parse_product_id(&args.id)?;
    let keyspace = store.read();
    let product = keyspace
        .product(&id)
        .with_context(|| format!("product not found: {id}"))?;
    print_json(out, product)?;
    Ok(0)
}

/// `twin events <id>`
pub fn run_events(store: &TwinStore, args: &InspectArgs, out: &mut dyn Write) -> Result<u8> {
    let id = crate::parse_product_id(&args.id)?;
    let keyspace = store.read();
    require_product(&keyspace, &id)?;
    let events: Vec<&LifecycleEvent> = keyspace.events(&id).collect();
    tracing::debug!(product_id = %id, count = events.len(), "listing events");
    print_json(out, &events)?;
    Ok(0)
}

/// `twin history <id>`
pub fn run_history(store: &TwinStore, args: &InspectArgs, out: &mut dyn Write) -> Result<u8> {
    let id = crate::parse_product_id(&args.id)?;
    let keyspace = store.read();
    require_product(&keyspace, &id)?;
    let records: Vec<&OwnershipRecord> = keyspace.ownership_records(&id).collect();
    print_json(out, &records)?;
    Ok(0)
}

fn require_product(keyspace: &Keyspace, id: &ProductId) -> Result<()> {
    if !keyspace.contains(id) {
        bail!("product not found: {id}");
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    writeln!(out, "{rendered}")?;
    Ok(())
}
