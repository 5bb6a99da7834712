// Integration tests for the grant store, the policy resolver, and the
// audit trail the mutating operations leave behind.

mod helpers;

use helpers::{PendingRequestBuilder, TestDb};
use portcullis::access::errors::AccessError;
use portcullis::access::requests;
use portcullis::access::types::{AccessLevel, AccessReason, AuditAction, Role};
use portcullis::access::{audit, grants, policy};

#[tokio::test]
async fn upsert_replaces_rather_than_appends() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    grants::upsert(db, "a@x.com", "res:sales", AccessLevel::Reader, "owner@x.com")
        .await
        .unwrap();
    grants::upsert(db, "a@x.com", "res:sales", AccessLevel::Writer, "admin@x.com")
        .await
        .unwrap();

    let grant = grants::lookup(db, "a@x.com", "res:sales")
        .await
        .unwrap()
        .expect("grant missing");
    assert_eq!(grant.level, AccessLevel::Writer);
    assert_eq!(grant.granted_by, "admin@x.com");
}

#[tokio::test]
async fn upsert_requires_non_empty_identifiers() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let err = grants::upsert(db, "", "res:sales", AccessLevel::Reader, "owner@x.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Validation(_)));

    let err = grants::upsert(db, "a@x.com", "res:sales", AccessLevel::Reader, " ")
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Validation(_)));
}

#[tokio::test]
async fn revoke_is_idempotent_and_audits_once() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    grants::upsert(db, "a@x.com", "res:sales", AccessLevel::Reader, "owner@x.com")
        .await
        .unwrap();

    assert!(grants::revoke(db, "admin@x.com", "a@x.com", "res:sales")
        .await
        .unwrap());
    // Second revoke is a safe no-op
    assert!(!grants::revoke(db, "admin@x.com", "a@x.com", "res:sales")
        .await
        .unwrap());

    let events = audit::list(db, None).await.unwrap();
    let revocations = events
        .iter()
        .filter(|e| e.action == AuditAction::GrantRevoked)
        .count();
    assert_eq!(revocations, 1, "no-op revoke must not emit an event");
}

#[tokio::test]
async fn can_access_is_monotonic_with_grant_state() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let before = policy::can_access(db, "a@x.com", Role::Requester, "res:sales")
        .await
        .unwrap();
    assert!(!before.allowed);
    assert_eq!(before.reason, AccessReason::NoGrant);

    grants::upsert(db, "a@x.com", "res:sales", AccessLevel::Reader, "owner@x.com")
        .await
        .unwrap();

    let after = policy::can_access(db, "a@x.com", Role::Requester, "res:sales")
        .await
        .unwrap();
    assert!(after.allowed);
    assert_eq!(after.reason, AccessReason::Granted);

    grants::revoke(db, "admin@x.com", "a@x.com", "res:sales")
        .await
        .unwrap();

    let revoked = policy::can_access(db, "a@x.com", Role::Requester, "res:sales")
        .await
        .unwrap();
    assert!(!revoked.allowed);
    assert_eq!(revoked.reason, AccessReason::NoGrant);
}

#[tokio::test]
async fn privileged_roles_bypass_grants() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    for role in [Role::DataSteward, Role::DataOwner, Role::Admin] {
        let check = policy::can_access(db, "nobody@x.com", role, "res:anything")
            .await
            .unwrap();
        assert!(check.allowed, "{role}");
        assert_eq!(check.reason, AccessReason::PrivilegedRole, "{role}");
    }
}

#[tokio::test]
async fn grants_are_scoped_to_their_resource() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    grants::upsert(db, "a@x.com", "res:sales", AccessLevel::Reader, "owner@x.com")
        .await
        .unwrap();

    let other_resource = policy::can_access(db, "a@x.com", Role::Requester, "res:finance")
        .await
        .unwrap();
    assert!(!other_resource.allowed);

    let other_subject = policy::can_access(db, "b@x.com", Role::Requester, "res:sales")
        .await
        .unwrap();
    assert!(!other_subject.allowed);
}

#[tokio::test]
async fn lifecycle_leaves_a_complete_audit_trail() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let request = PendingRequestBuilder::new("a@x.com").create(db).await;
    requests::decide(db, &request.id, "owner@x.com", "DATA_OWNER", "APPROVED", None)
        .await
        .unwrap();

    // Newest first: grant added, decision, submission
    let events = audit::list(db, None).await.unwrap();
    let actions: Vec<AuditAction> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::GrantAdded,
            AuditAction::RequestDecided,
            AuditAction::RequestSubmitted,
        ]
    );

    // Every event is attributable to its actor
    assert_eq!(events[0].actor_subject, "owner@x.com");
    assert_eq!(events[1].actor_subject, "owner@x.com");
    assert_eq!(events[2].actor_subject, "a@x.com");

    // The submission event points at the request
    assert_eq!(events[2].entity_type, "access_request");
    assert_eq!(events[2].entity_id, request.id);
    let detail = events[2].detail.as_ref().expect("detail missing");
    assert_eq!(detail["resource_ref"], "res:sales");
}

#[tokio::test]
async fn audit_limit_is_clamped() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    for i in 0..3 {
        grants::upsert(
            db,
            &format!("user{i}@x.com"),
            "res:sales",
            AccessLevel::Reader,
            "owner@x.com",
        )
        .await
        .unwrap();
    }

    let events = audit::list(db, Some(2)).await.unwrap();
    assert_eq!(events.len(), 2);

    // A zero limit is clamped up to one rather than rejected
    let events = audit::list(db, Some(0)).await.unwrap();
    assert_eq!(events.len(), 1);
}
