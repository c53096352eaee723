//! # Verify Subcommand
//!
//! Recomputes every event digest and checks each `previous_digest` link.
//! Exit code 2 signals that at least one chain is broken.

use std::io::Write;

use anyhow::{bail, Result};
use clap::Args;

use twin_core::ProductId;
use twin_state::event::verify_chain;
use twin_state::{ChainReport, Keyspace, LifecycleEvent, TwinStore};

/// Exit code when a chain fails verification.
pub const EXIT_BROKEN: u8 = 2;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Verify only this product. Defaults to every product in the journal.
    #[arg(value_name = "PRODUCT_ID")]
    pub id: Option<String>,
}

/// `twin verify [<id>]`
pub fn run_verify(store: &TwinStore, args: &VerifyArgs, out: &mut dyn Write) -> Result<u8> {
    let keyspace = store.read();
    let ids: Vec<ProductId> = match &args.id {
        Some(raw) => {
            let id = crate::parse_product_id(raw)?;
            if !keyspace.contains(&id) {
                bail!("product not found: {id}");
            }
            vec![id]
        }
        None => keyspace.product_ids().cloned().collect(),
    };

    let mut broken = 0usize;
    for id in &ids {
        let report = check(&keyspace, id);
        if report.intact {
            writeln!(out, "{id}: intact ({} events)", report.event_count)?;
        } else {
            broken += 1;
            let (event_id, reason) = report
                .first_break
                .as_ref()
                .map(|(e, r)| (*e, format!("{r:?}")))
                .unwrap_or_default();
            tracing::error!(product_id = %id, event_id, reason = %reason, "event chain broken");
            writeln!(out, "{id}: BROKEN at event {event_id} ({reason})")?;
        }
    }

    writeln!(out, "{} checked, {broken} broken", ids.len())?;
    Ok(if broken == 0 { 0 } else { EXIT_BROKEN })
}

fn check(keyspace: &Keyspace, id: &ProductId) -> ChainReport {
    let events: Vec<LifecycleEvent> = keyspace.events(id).cloned().collect();
    verify_chain(id, keyspace.event_count(id), &events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::seed_journal;

    fn run(path: &std::path::Path, id: Option<&str>) -> (u8, String) {
        let store = crate::load_journal(path).unwrap();
        let mut buf = Vec::new();
        let code = run_verify(
            &store,
            &VerifyArgs {
                id: id.map(str::to_string),
            },
            &mut buf,
        )
        .unwrap();
        (code, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn untouched_journal_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twin.journal");
        seed_journal(&path);

        let (code, text) = run(&path, None);
        assert_eq!(code, 0);
        assert!(text.contains("P1: intact (3 events)"));
        assert!(text.contains("P2: intact (1 events)"));
        assert!(text.contains("2 checked, 0 broken"));
    }

    #[test]
    fn edited_event_breaks_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twin.journal");
        seed_journal(&path);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Seal replaced"));
        std::fs::write(&path, raw.replace("Seal replaced", "Seal inspected")).unwrap();

        let (code, text) = run(&path, None);
        assert_eq!(code, EXIT_BROKEN);
        assert!(text.contains("P1: BROKEN at event 3 (DigestMismatch)"));
        assert!(text.contains("P2: intact"));

        let (code, _) = run(&path, Some("P2"));
        assert_eq!(code, 0);
    }

    #[test]
    fn unknown_product_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twin.journal");
        seed_journal(&path);
        let store = crate::load_journal(&path).unwrap();
        let mut buf = Vec::new();
        let args = VerifyArgs {
            id: Some("NOPE".into()),
        };
        assert!(run_verify(&store, &args, &mut buf).is_err());
    }
}
