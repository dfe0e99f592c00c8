//! Parcel assignment reconciliation through the domain service

mod common;

use common::*;
use land_registry::contract::*;
use std::sync::Arc;

fn request(farmer: &Farmer, owned: &[&str], cultivated: &[&str]) -> AssignmentRequest {
    AssignmentRequest::new(
        farmer.id,
        owned.iter().copied(),
        cultivated.iter().copied(),
    )
}

#[tokio::test]
async fn test_assignment_replaces_owned_set() {
    print_test_header(
        "test_assignment_replaces_owned_set",
        &[
            "Requesting owned {A1, A3} for a farmer holding A1, A2",
            "keeps A1, releases A2 in both roles and claims A3",
        ],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);
    fixture.print_structure();

    println!("\n📝 Stage 1: Commit the new owned set");
    let outcome = registry
        .service
        .assign_parcels(&admin(), &request(&fixture.ion, &["A1", "A3"], &[]), false)
        .await
        .expect("assignment should succeed");

    let AssignmentOutcome::Committed(summary) = outcome else {
        panic!("expected committed outcome");
    };
    assert_eq!(summary.owned, vec!["A1", "A3"]);
    assert!(summary.cultivated.is_empty());
    assert!(!summary.forced);
    // A2 owner, A2 cultivator, A3 owner
    assert_eq!(summary.changes, 3);

    registry.store.print_parcels("after commit");

    println!("\n📝 Stage 2: Verify stored holdings");
    assert_eq!(registry.store.owned_by(fixture.ion.id), vec!["A1", "A3"]);
    assert!(registry.store.cultivated_by(fixture.ion.id).is_empty());
    let a2 = registry.store.parcel("A2").expect("A2 exists");
    assert_eq!(a2.owner_id, None);
    assert_eq!(a2.cultivator_id, None);
    // Other farmers are untouched
    assert_eq!(registry.store.owned_by(fixture.maria.id), vec!["B1"]);
    assert_eq!(registry.store.cultivated_by(fixture.maria.id), vec!["B1", "C1"]);

    println!("\n📝 Stage 3: Verify audit entry");
    let entries = registry.store.logs_of(LogType::Assignment);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "Assigned Parcels");
    assert_eq!(entries[0].actor, "admin:root");
    assert_eq!(
        entries[0].details,
        "Fmr: Ion Popescu. Own: [A1,A3] Cult: [N] F:false"
    );

    println!("\n✅ Owned set replaced");
}

#[tokio::test]
async fn test_assignment_is_idempotent() {
    print_test_header(
        "test_assignment_is_idempotent",
        &["Committing the same final state twice writes nothing the second time"],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);
    let req = request(&fixture.ion, &["A1", "A3"], &["A3"]);

    println!("\n📝 Stage 1: First commit");
    let first = registry
        .service
        .assign_parcels(&admin(), &req, false)
        .await
        .expect("first commit");
    assert!(matches!(first, AssignmentOutcome::Committed(ref s) if s.changes > 0));

    println!("\n📝 Stage 2: Repeat the same request");
    let second = registry
        .service
        .assign_parcels(&admin(), &req, false)
        .await
        .expect("second commit");
    let AssignmentOutcome::Committed(summary) = second else {
        panic!("expected committed outcome");
    };
    assert_eq!(summary.changes, 0);
    assert_eq!(registry.store.owned_by(fixture.ion.id), vec!["A1", "A3"]);
    assert_eq!(registry.store.cultivated_by(fixture.ion.id), vec!["A3"]);

    println!("\n✅ Second commit was a no-op");
}

#[tokio::test]
async fn test_empty_request_for_empty_farmer_is_no_change() {
    print_test_header(
        "test_empty_request_for_empty_farmer_is_no_change",
        &["An empty request for a farmer holding nothing returns NoChange without audit"],
    );

    let registry = TestRegistry::new();
    ValeaMare::seed(&registry.store);
    let newcomer = registry.store.seed_farmer("Elena Dobre", "RO1003", VILLAGE);

    let outcome = registry
        .service
        .assign_parcels(&admin(), &request(&newcomer, &[], &[]), false)
        .await
        .expect("empty request");

    assert_eq!(outcome, AssignmentOutcome::NoChange);
    assert!(registry.store.logs_of(LogType::Assignment).is_empty());
}

#[tokio::test]
async fn test_empty_request_releases_everything() {
    print_test_header(
        "test_empty_request_releases_everything",
        &["An empty request for a farmer with holdings clears both roles"],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);

    let outcome = registry
        .service
        .assign_parcels(&admin(), &request(&fixture.ion, &[], &[]), false)
        .await
        .expect("release all");

    let AssignmentOutcome::Committed(summary) = outcome else {
        panic!("expected committed outcome");
    };
    assert_eq!(summary.changes, 3);
    assert!(registry.store.owned_by(fixture.ion.id).is_empty());
    assert!(registry.store.cultivated_by(fixture.ion.id).is_empty());
    assert_eq!(
        registry.store.logs_of(LogType::Assignment)[0].details,
        "Fmr: Ion Popescu. Own: [N] Cult: [N] F:false"
    );
}

#[tokio::test]
async fn test_conflicts_block_unforced_commit() {
    print_test_header(
        "test_conflicts_block_unforced_commit",
        &[
            "Claiming parcels held by another farmer reports conflicts",
            "and leaves the store untouched",
        ],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);
    let req = request(&fixture.ion, &["A1", "A2", "B1"], &["A2", "C1"]);

    println!("\n📝 Stage 1: Detect only");
    let conflicts = registry
        .service
        .detect_conflicts(&admin(), &req)
        .await
        .expect("detect");
    assert_eq!(conflicts.len(), 2);

    let b1 = conflicts
        .iter()
        .find(|c| c.parcel_id == "B1")
        .expect("B1 conflict");
    assert_eq!(b1.role, AssignmentRole::Owner);
    assert_eq!(b1.current_holder_id, fixture.maria.id);
    assert_eq!(b1.current_holder_name.as_deref(), Some("Maria Ionescu"));
    assert_eq!(b1.target_farmer_id, fixture.ion.id);
    assert_eq!(b1.target_farmer_name, "Ion Popescu");

    let c1 = conflicts
        .iter()
        .find(|c| c.parcel_id == "C1")
        .expect("C1 conflict");
    assert_eq!(c1.role, AssignmentRole::Cultivator);
    assert_eq!(c1.current_holder_id, fixture.maria.id);

    println!("\n📝 Stage 2: Unforced assign returns the same conflicts");
    let outcome = registry
        .service
        .assign_parcels(&admin(), &req, false)
        .await
        .expect("assign");
    let AssignmentOutcome::Conflicts(reported) = outcome else {
        panic!("expected conflicts");
    };
    assert_eq!(reported, conflicts);

    println!("\n📝 Stage 3: Nothing was written");
    assert_eq!(registry.store.owned_by(fixture.maria.id), vec!["B1"]);
    assert_eq!(registry.store.cultivated_by(fixture.maria.id), vec!["B1", "C1"]);
    assert!(registry.store.logs_of(LogType::Assignment).is_empty());

    println!("\n✅ Conflicts reported, store unchanged");
}

#[tokio::test]
async fn test_forced_commit_overwrites_other_holders() {
    print_test_header(
        "test_forced_commit_overwrites_other_holders",
        &["force=true takes the conflicting parcels from their holders"],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);
    let req = request(&fixture.ion, &["A1", "A2", "B1"], &["A2", "C1"]);

    let outcome = registry
        .service
        .assign_parcels(&admin(), &req, true)
        .await
        .expect("forced assign");
    let AssignmentOutcome::Committed(summary) = outcome else {
        panic!("expected committed outcome");
    };
    assert!(summary.forced);

    let b1 = registry.store.parcel("B1").expect("B1");
    assert_eq!(b1.owner_id, Some(fixture.ion.id));
    // B1 was not requested for cultivation, so Maria keeps it
    assert_eq!(b1.cultivator_id, Some(fixture.maria.id));
    let c1 = registry.store.parcel("C1").expect("C1");
    assert_eq!(c1.cultivator_id, Some(fixture.ion.id));
    assert_eq!(c1.owner_id, None);

    let entries = registry.store.logs_of(LogType::Assignment);
    assert_eq!(
        entries[0].details,
        "Fmr: Ion Popescu. Own: [A1,A2,B1] Cult: [A2,C1] F:true"
    );
}

#[tokio::test]
async fn test_resolve_keep_and_force_per_conflict() {
    print_test_header(
        "test_resolve_keep_and_force_per_conflict",
        &[
            "Detect conflicts, keep one, force the other, then commit",
            "Kept parcels stay with their holder",
        ],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);
    let mut req = request(&fixture.ion, &["A1", "A2", "B1"], &["A2", "C1"]);

    println!("\n📝 Stage 1: Detect");
    let conflicts = registry
        .service
        .detect_conflicts(&admin(), &req)
        .await
        .expect("detect");
    assert_eq!(conflicts.len(), 2);

    println!("\n📝 Stage 2: Keep B1 with Maria, force C1 to Ion");
    let decisions: Vec<ConflictDecision> = conflicts
        .iter()
        .map(|c| {
            let resolution = if c.parcel_id == "B1" {
                ConflictResolution::Keep
            } else {
                ConflictResolution::Force
            };
            ConflictDecision::for_conflict(c, resolution)
        })
        .collect();
    req.resolve(decisions);
    assert!(!req.desired_owned.contains("B1"));
    assert!(req.desired_cultivated.contains("C1"));

    println!("\n📝 Stage 3: Commit resolved request");
    let outcome = registry
        .service
        .commit_resolved(&admin(), &req)
        .await
        .expect("commit resolved");
    assert!(matches!(outcome, AssignmentOutcome::Committed(ref s) if s.forced));

    registry.store.print_parcels("after resolution");
    let b1 = registry.store.parcel("B1").expect("B1");
    assert_eq!(b1.owner_id, Some(fixture.maria.id));
    let c1 = registry.store.parcel("C1").expect("C1");
    assert_eq!(c1.cultivator_id, Some(fixture.ion.id));
    assert_eq!(registry.store.owned_by(fixture.ion.id), vec!["A1", "A2"]);

    println!("\n✅ Per-conflict resolution applied");
}

#[tokio::test]
async fn test_cultivation_moves_with_ownership() {
    print_test_header(
        "test_cultivation_moves_with_ownership",
        &[
            "Taking over a parcel its owner also cultivates reports one owner conflict",
            "Requesting only the cultivation reports a cultivator conflict",
        ],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);

    println!("\n📝 Stage 1: Own and cultivate B1");
    let both = registry
        .service
        .detect_conflicts(&admin(), &request(&fixture.ion, &["A1", "A2", "B1"], &["A2", "B1"]))
        .await
        .expect("detect");
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].parcel_id, "B1");
    assert_eq!(both[0].role, AssignmentRole::Owner);

    println!("\n📝 Stage 2: Cultivate B1 only");
    let cultivate_only = registry
        .service
        .detect_conflicts(&admin(), &request(&fixture.ion, &["A1", "A2"], &["A2", "B1"]))
        .await
        .expect("detect");
    assert_eq!(cultivate_only.len(), 1);
    assert_eq!(cultivate_only[0].parcel_id, "B1");
    assert_eq!(cultivate_only[0].role, AssignmentRole::Cultivator);

    println!("\n📝 Stage 3: Cultivator differs from owner");
    // C1 is unowned and cultivated by Maria, so ownership does not carry it
    let unowned = registry
        .service
        .detect_conflicts(&admin(), &request(&fixture.ion, &["C1"], &["C1"]))
        .await
        .expect("detect");
    assert_eq!(unowned.len(), 1);
    assert_eq!(unowned[0].role, AssignmentRole::Cultivator);
}

#[tokio::test]
async fn test_parcels_outside_village_are_invalid() {
    print_test_header(
        "test_parcels_outside_village_are_invalid",
        &["Unknown ids and ids from another village are rejected, sorted"],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);

    let err = registry
        .service
        .assign_parcels(
            &admin(),
            &request(&fixture.ion, &["A1", "Z1"], &["Q9"]),
            true,
        )
        .await
        .expect_err("invalid ids must fail");

    assert_eq!(
        err,
        RegistryError::InvalidParcelIds {
            ids: vec!["Q9".to_string(), "Z1".to_string()]
        }
    );
    // Nothing written, Z1 stays with the neighbour
    assert_eq!(registry.store.owned_by(fixture.ion.id), vec!["A1", "A2"]);
    assert_eq!(
        registry.store.parcel("Z1").and_then(|p| p.owner_id),
        Some(fixture.neighbour.id)
    );

    let failures = registry.store.logs_of(LogType::Assignment);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].action, "Failed Assignment");
    assert!(failures[0]
        .details
        .starts_with(&format!("FmrID: {}. Err: ", fixture.ion.id)));
}

#[tokio::test]
async fn test_unknown_farmer_is_not_found() {
    let registry = TestRegistry::new();
    ValeaMare::seed(&registry.store);

    let err = registry
        .service
        .assign_parcels(
            &admin(),
            &AssignmentRequest::new(uuid::Uuid::new_v4(), ["A1"], Vec::<String>::new()),
            false,
        )
        .await
        .expect_err("unknown farmer");

    assert!(matches!(err, RegistryError::NotFound { ref resource, .. } if resource == "farmer"));
}

#[tokio::test]
async fn test_assignment_access_control() {
    print_test_header(
        "test_assignment_access_control",
        &[
            "Mayors assign within their village only",
            "Farmers cannot assign at all",
        ],
    );

    let registry = TestRegistry::new();
    let fixture = ValeaMare::seed(&registry.store);
    let req = request(&fixture.ion, &["A1", "A2", "A3"], &["A2"]);

    println!("\n📝 Stage 1: Farmer actor");
    let err = registry
        .service
        .assign_parcels(&farmer_actor(&fixture.ion), &req, false)
        .await
        .expect_err("farmer forbidden");
    assert!(matches!(err, RegistryError::Forbidden { .. }));

    println!("\n📝 Stage 2: Mayor of another village");
    let err = registry
        .service
        .assign_parcels(&mayor_of(OTHER_VILLAGE), &req, false)
        .await
        .expect_err("foreign mayor forbidden");
    assert!(matches!(err, RegistryError::Forbidden { .. }));
    assert_eq!(registry.store.owned_by(fixture.ion.id), vec!["A1", "A2"]);

    println!("\n📝 Stage 3: Mayor of the farmer's village");
    let mayor = mayor_of(VILLAGE);
    let outcome = registry
        .service
        .assign_parcels(&mayor, &req, false)
        .await
        .expect("own mayor allowed");
    assert!(matches!(outcome, AssignmentOutcome::Committed(_)));
    assert_eq!(registry.store.owned_by(fixture.ion.id), vec!["A1", "A2", "A3"]);

    let committed: Vec<LogEntry> = registry
        .store
        .logs_of(LogType::Assignment)
        .into_iter()
        .filter(|l| l.action == "Assigned Parcels")
        .collect();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].actor, mayor.audit_id());
}

#[tokio::test]
async fn test_concurrent_change_rolls_back_whole_plan() {
    print_test_header(
        "test_concurrent_change_rolls_back_whole_plan",
        &[
            "A parcel claimed by someone else between planning and commit",
            "rejects the entire plan as stale",
        ],
    );

    let store = InMemoryStore::new();
    let fixture = ValeaMare::seed(&store);
    let parcels = Arc::new(
        FaultyParcelRepo::new(store.clone()).racing_owner("A3", fixture.maria.id),
    );
    let registry = TestRegistry::with_parcels(store, parcels);

    println!("\n📝 Stage 1: Commit while A3 is claimed concurrently");
    let err = registry
        .service
        .assign_parcels(&admin(), &request(&fixture.ion, &["A1", "A3"], &[]), false)
        .await
        .expect_err("stale plan");

    assert_eq!(
        err,
        RegistryError::StaleAssignment {
            parcel_ids: vec!["A3".to_string()]
        }
    );
    assert!(err.is_retryable());

    println!("\n📝 Stage 2: Earlier steps of the plan were rolled back");
    registry.store.print_parcels("after stale commit");
    let a2 = registry.store.parcel("A2").expect("A2");
    assert_eq!(a2.owner_id, Some(fixture.ion.id));
    assert_eq!(a2.cultivator_id, Some(fixture.ion.id));
    assert_eq!(
        registry.store.parcel("A3").and_then(|p| p.owner_id),
        Some(fixture.maria.id)
    );

    let entries = registry.store.logs_of(LogType::Assignment);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "Failed Assignment");

    println!("\n✅ Stale plan rejected atomically");
}

#[tokio::test]
async fn test_store_failure_during_commit() {
    let store = InMemoryStore::new();
    let fixture = ValeaMare::seed(&store);
    let parcels = Arc::new(FaultyParcelRepo::new(store.clone()).failing_apply());
    let registry = TestRegistry::with_parcels(store, parcels);

    let err = registry
        .service
        .assign_parcels(&admin(), &request(&fixture.ion, &["A1"], &[]), false)
        .await
        .expect_err("store failure");

    assert_eq!(err, RegistryError::Store);
    assert_eq!(registry.store.owned_by(fixture.ion.id), vec!["A1", "A2"]);
    let entries = registry.store.logs_of(LogType::Assignment);
    assert_eq!(entries[0].details, format!("FmrID: {}. Err: Store error", fixture.ion.id));
}
