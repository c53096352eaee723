//! # Authorization Gate Through the Service
//!
//! Every rejected mutation must leave the registry, ownership history and
//! event log exactly as they were.

use twin_core::{Principal, ProductId, Timestamp};
use twin_state::{
    Action, Dimensions, MaintenanceRecord, ProductMetadata, ProductStatus, RegistryError,
    ServiceConfig, StatusPolicy, TwinService,
};

const REGISTRAR: &str = "registrar";

fn principal(s: &str) -> Principal {
    Principal::new(s).expect("principal")
}

fn pid(s: &str) -> ProductId {
    ProductId::new(s).expect("product id")
}

fn now() -> Timestamp {
    Timestamp::parse("2024-06-01T12:00:00Z").unwrap()
}

fn metadata(serial: &str) -> ProductMetadata {
    ProductMetadata {
        name: "Sensor".into(),
        batch_number: "B1".into(),
        model: "S-1".into(),
        serial_number: serial.into(),
        materials: vec![],
        weight: 120,
        dimensions: Dimensions::default(),
        location: None,
        certification: None,
        warranty_months: 6,
    }
}

fn service_with_p1() -> TwinService {
    let service = TwinService::in_memory(ServiceConfig::new(principal(REGISTRAR)));
    service
        .create_product(pid("P1"), metadata("S1"), &principal(REGISTRAR), now())
        .unwrap();
    service
}

#[test]
fn only_the_registrar_creates() {
    let service = TwinService::in_memory(ServiceConfig::new(principal(REGISTRAR)));
    for caller in ["alice", "registrar2", "Registrar", "did:key:z6MkOther"] {
        let err = service
            .create_product(pid("P1"), metadata("S1"), &principal(caller), now())
            .unwrap_err();
        assert!(
            matches!(err, RegistryError::NotAuthorized { action: Action::Create, .. }),
            "{caller}: {err:?}"
        );
    }
    assert!(!service.product_exists(&pid("P1")));
    assert_eq!(service.get_event_count(&pid("P1")), 0);
}

#[test]
fn duplicate_create_leaves_prior_record() {
    let service = service_with_p1();
    let before = service.get_product(&pid("P1")).unwrap();

    let err = service
        .create_product(pid("P1"), metadata("S2"), &principal(REGISTRAR), now())
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists(ref id) if id.as_str() == "P1"));
    assert_eq!(service.get_product(&pid("P1")).unwrap(), before);
    assert_eq!(service.get_event_count(&pid("P1")), 1);
}

#[test]
fn non_owners_cannot_mutate() {
    let service = service_with_p1();
    let mallory = principal("mallory");

    let err = service
        .transfer_ownership(&pid("P1"), mallory.clone(), "theft".into(), &mallory, now())
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotAuthorized { action: Action::Transfer, .. }));

    let err = service
        .update_status(&pid("P1"), 5, None, None, &mallory, now())
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotAuthorized { action: Action::UpdateStatus, .. }));

    let err = service
        .add_maintenance_record(
            &pid("P1"),
            MaintenanceRecord {
                description: "fake".into(),
                location: None,
                cost: 0,
                technician: "m".into(),
            },
            &mallory,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotAuthorized { action: Action::AddMaintenance, .. }));

    assert_eq!(service.get_event_count(&pid("P1")), 1);
    assert_eq!(service.get_transfer_count(&pid("P1")), 0);
    let product = service.get_product(&pid("P1")).unwrap();
    assert_eq!(product.current_owner, principal(REGISTRAR));
    assert_eq!(product.status, ProductStatus::Manufactured);
}

#[test]
fn missing_product_reported_before_authorization() {
    let service = service_with_p1();
    let err = service
        .transfer_ownership(&pid("P9"), principal("a"), "x".into(), &principal("a"), now())
        .unwrap_err();
    assert!(matches!(err, RegistryError::ProductNotFound(_)));
}

#[test]
fn status_range_checked_first() {
    let service = service_with_p1();
    for code in [0i64, 6, 7, 200, 255, 256, 261, -1] {
        let err = service
            .update_status(&pid("P1"), code, None, None, &principal(REGISTRAR), now())
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidStatus(c) if c == code));
    }
    // Out-of-range code wins even when the product is unknown or the caller
    // is not the owner.
    let err = service
        .update_status(&pid("P9"), 0, None, None, &principal("mallory"), now())
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidStatus(0)));
    assert_eq!(service.get_event_count(&pid("P1")), 1);
}

#[test]
fn any_in_range_status_is_accepted_by_default() {
    let service = service_with_p1();
    for code in [5u8, 1, 3, 2, 4, 4] {
        service
            .update_status(&pid("P1"), code.into(), None, None, &principal(REGISTRAR), now())
            .unwrap();
        assert_eq!(service.get_product(&pid("P1")).unwrap().status.code(), code);
    }
    assert_eq!(service.get_event_count(&pid("P1")), 7);
}

#[test]
fn forward_only_policy_rejects_regressions() {
    let config =
        ServiceConfig::new(principal(REGISTRAR)).with_status_policy(StatusPolicy::ForwardOnly);
    let service = TwinService::in_memory(config);
    service
        .create_product(pid("P1"), metadata("S1"), &principal(REGISTRAR), now())
        .unwrap();

    service
        .update_status(&pid("P1"), 3, None, None, &principal(REGISTRAR), now())
        .unwrap();
    let err = service
        .update_status(&pid("P1"), 2, None, None, &principal(REGISTRAR), now())
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::TransitionRejected {
            from: ProductStatus::Delivered,
            to: ProductStatus::InTransit
        }
    ));
    assert_eq!(service.get_event_count(&pid("P1")), 2);
}

#[test]
fn new_owner_gains_every_owner_right() {
    let service = service_with_p1();
    let alice = principal("alice");
    service
        .transfer_ownership(&pid("P1"), alice.clone(), "sale".into(), &principal(REGISTRAR), now())
        .unwrap();

    service
        .update_status(&pid("P1"), 4, Some("Workshop".into()), None, &alice, now())
        .unwrap();
    service
        .add_maintenance_record(
            &pid("P1"),
            MaintenanceRecord {
                description: "Calibrated".into(),
                location: None,
                cost: 50,
                technician: "T".into(),
            },
            &alice,
            now(),
        )
        .unwrap();
    service
        .transfer_ownership(&pid("P1"), principal("bob"), "resale".into(), &alice, now())
        .unwrap();

    assert_eq!(service.get_event_count(&pid("P1")), 5);
    assert_eq!(service.get_transfer_count(&pid("P1")), 2);
    // Registrar keeps the create right only.
    let err = service
        .update_status(&pid("P1"), 1, None, None, &principal(REGISTRAR), now())
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotAuthorized { .. }));
}
