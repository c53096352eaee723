//! # Product Lifecycle Walkthrough
//!
//! Drives one product from manufacture through a sale, a status change, a
//! rejected status change by the former owner, and maintenance, checking the
//! registry, ownership history and event log after every step.

use twin_core::{Clock, ManualClock, Principal, ProductId, Timestamp};
use twin_state::{
    Dimensions, EventType, MaintenanceRecord, ProductMetadata, ProductStatus, RegistryError,
    ServiceConfig, TwinService, SECONDS_PER_WARRANTY_MONTH,
};

fn registrar() -> Principal {
    Principal::new("did:key:z6MkRegistrar").expect("registrar principal")
}

fn user() -> Principal {
    Principal::new("did:key:z6MkUser").expect("user principal")
}

fn p1() -> ProductId {
    ProductId::new("P1").expect("product id")
}

fn metadata() -> ProductMetadata {
    ProductMetadata {
        name: "Industrial Pump".into(),
        batch_number: "B-2024-11".into(),
        model: "IP-500".into(),
        serial_number: "SN-500-0001".into(),
        materials: vec!["cast iron".into(), "nitrile".into()],
        weight: 48_000,
        dimensions: Dimensions {
            length: 900,
            width: 450,
            height: 600,
        },
        location: Some("Factory A".into()),
        certification: Some("ISO 9001".into()),
        warranty_months: 24,
    }
}

#[test]
fn sale_then_status_change_then_rejected_update() {
    let clock = ManualClock::new(Timestamp::parse("2024-05-01T08:00:00Z").unwrap());
    let service = TwinService::in_memory(ServiceConfig::new(registrar()));

    // Create.
    let created_at = clock.now();
    service
        .create_product(p1(), metadata(), &registrar(), created_at)
        .unwrap();
    let product = service.get_product(&p1()).unwrap();
    assert_eq!(product.status, ProductStatus::Manufactured);
    assert_eq!(product.current_owner, registrar());
    assert_eq!(product.manufacturer, registrar());
    assert_eq!(product.created_at, created_at);
    assert_eq!(
        product.warranty_expiry.epoch_secs() - created_at.epoch_secs(),
        24 * SECONDS_PER_WARRANTY_MONTH
    );
    assert_eq!(service.get_event_count(&p1()), 1);
    let first = service.get_lifecycle_event(&p1(), 1).unwrap();
    assert_eq!(first.event_type, EventType::Manufactured);
    assert_eq!(first.recorded_by, registrar());

    // Sale.
    clock.advance(3600);
    let sold_at = clock.now();
    service
        .transfer_ownership(&p1(), user(), "sale".into(), &registrar(), sold_at)
        .unwrap();
    assert_eq!(service.get_product(&p1()).unwrap().current_owner, user());
    assert_eq!(service.get_event_count(&p1()), 2);

    let record = service.get_ownership_history(&p1(), sold_at).unwrap();
    assert_eq!(record.previous_owner, registrar());
    assert_eq!(record.new_owner, user());
    assert_eq!(record.reason, "sale");
    assert_eq!(record.sequence, 1);
    assert!(service
        .get_ownership_history(&p1(), created_at)
        .is_none());

    // New owner moves it.
    clock.advance(60);
    service
        .update_status(
            &p1(),
            2,
            Some("Port of Rotterdam".into()),
            Some("Shipped".into()),
            &user(),
            clock.now(),
        )
        .unwrap();
    let product = service.get_product(&p1()).unwrap();
    assert_eq!(product.status, ProductStatus::InTransit);
    assert_eq!(product.location.as_deref(), Some("Port of Rotterdam"));
    assert_eq!(service.get_event_count(&p1()), 3);

    // Former owner is locked out.
    clock.advance(60);
    let err = service
        .update_status(&p1(), 3, None, None, &registrar(), clock.now())
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotAuthorized { .. }));
    assert_eq!(service.get_event_count(&p1()), 3);
    assert_eq!(
        service.get_product(&p1()).unwrap().status,
        ProductStatus::InTransit
    );

    // Maintenance leaves the product record untouched.
    let before = service.get_product(&p1()).unwrap();
    service
        .add_maintenance_record(
            &p1(),
            MaintenanceRecord {
                description: "Impeller inspected".into(),
                location: Some("Depot 3".into()),
                cost: 12_000,
                technician: "T-42".into(),
            },
            &user(),
            clock.now(),
        )
        .unwrap();
    assert_eq!(service.get_product(&p1()).unwrap(), before);
    assert_eq!(service.get_event_count(&p1()), 4);

    let events = service.lifecycle_events(&p1());
    let kinds: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        kinds,
        [
            EventType::Manufactured,
            EventType::OwnershipTransfer,
            EventType::StatusUpdate,
            EventType::Maintenance,
        ]
    );
    assert_eq!(
        events[3].additional_data.as_deref(),
        Some("Cost: 12000, Technician: T-42")
    );

    let report = service.verify_event_chain(&p1()).unwrap();
    assert!(report.intact);
    assert_eq!(report.events_checked, 4);
}

#[test]
fn same_second_transfers_keep_both_records() {
    let at = Timestamp::parse("2024-05-01T08:00:00Z").unwrap();
    let service = TwinService::in_memory(ServiceConfig::new(registrar()));
    service
        .create_product(p1(), metadata(), &registrar(), at)
        .unwrap();

    service
        .transfer_ownership(&p1(), user(), "sale".into(), &registrar(), at)
        .unwrap();
    service
        .transfer_ownership(&p1(), registrar(), "return".into(), &user(), at)
        .unwrap();

    assert_eq!(service.get_transfer_count(&p1()), 2);
    let history = service.ownership_history(&p1());
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].reason, "sale");
    assert_eq!(history[1].reason, "return");

    // The timestamp lookup resolves to the latest transfer at that instant.
    assert_eq!(
        service.get_ownership_history(&p1(), at).unwrap().reason,
        "return"
    );
}

#[test]
fn reads_are_side_effect_free() {
    let service = TwinService::in_memory(ServiceConfig::new(registrar()));
    let now = Timestamp::parse("2024-05-01T08:00:00Z").unwrap();
    service
        .create_product(p1(), metadata(), &registrar(), now)
        .unwrap();

    let product = service.get_product(&p1());
    let count = service.get_event_count(&p1());
    let exists = service.product_exists(&p1());
    for _ in 0..3 {
        assert_eq!(service.get_product(&p1()), product);
        assert_eq!(service.get_event_count(&p1()), count);
        assert_eq!(service.product_exists(&p1()), exists);
    }

    let unknown = ProductId::new("UNKNOWN").unwrap();
    assert!(service.get_product(&unknown).is_none());
    assert!(!service.product_exists(&unknown));
    assert_eq!(service.get_event_count(&unknown), 0);
    assert!(service.lifecycle_events(&unknown).is_empty());
}
