//! SeaORM repositories against an in-memory SQLite database

mod common;

use chrono::Utc;
use common::*;
use land_registry::contract::*;
use land_registry::domain::repository::{ApplyOutcome, Repositories};
use land_registry::domain::{ParcelUpdate, Service, ServiceOptions, Wgs84Passthrough};
use land_registry::infra::storage::migrations::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use uuid::Uuid;

/// Single-connection pool so every query sees the same in-memory database
async fn sqlite() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("migrations");
    Arc::new(db)
}

fn farmer(name: &str, code: &str) -> Farmer {
    let now = Utc::now();
    Farmer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        company_code: code.to_string(),
        village: VILLAGE.to_string(),
        email: None,
        phone: None,
        password_hash: "plain$password1".to_string(),
        color: Some("hsl(217, 91%, 60%)".to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn geometry(id: &str, area: f64) -> ParcelGeometry {
    ParcelGeometry {
        id: id.to_string(),
        village: VILLAGE.to_string(),
        area,
        coordinates: square(25.0, 45.0, 0.001),
    }
}

fn assign(parcel_id: &str, expected: Option<Uuid>, value: Option<Uuid>) -> ParcelUpdate {
    ParcelUpdate {
        parcel_id: parcel_id.to_string(),
        role: AssignmentRole::Owner,
        expected,
        value,
    }
}

async fn seeded() -> (Repositories, Farmer, Farmer) {
    let repos = land_registry::infra::storage::repositories(sqlite().await);
    let ion = repos
        .farmers
        .create(&farmer("Ion Popescu", "RO1001"))
        .await
        .expect("create ion");
    let maria = repos
        .farmers
        .create(&farmer("Maria Ionescu", "RO1002"))
        .await
        .expect("create maria");
    for (id, area) in [("A1", 1.5), ("A2", 2.0), ("A3", 0.8)] {
        repos
            .parcels
            .upsert_geometry(&geometry(id, area))
            .await
            .expect("upsert parcel");
    }
    (repos, ion, maria)
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = sqlite().await;
    Migrator::up(&*db, None).await.expect("second run is a no-op");
    let status = Migrator::get_pending_migrations(&*db)
        .await
        .expect("pending");
    assert!(status.is_empty());
}

#[tokio::test]
async fn test_farmer_round_trip_and_lookup() {
    let (repos, ion, _) = seeded().await;

    let loaded = repos
        .farmers
        .find_by_id(ion.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(loaded.name, "Ion Popescu");
    assert_eq!(loaded.color, ion.color);

    let by_code = repos
        .farmers
        .find_by_company_code("RO1002")
        .await
        .expect("find by code")
        .expect("present");
    assert_eq!(by_code.name, "Maria Ionescu");

    let listed = repos.farmers.list(Some(VILLAGE)).await.expect("list");
    let names: Vec<&str> = listed.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Ion Popescu", "Maria Ionescu"]);
    assert_eq!(repos.farmers.count().await.expect("count"), 2);

    // Unique index on company code
    let duplicate = repos.farmers.create(&farmer("Ion Popa", "RO1001")).await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_upsert_updates_geometry_only() {
    print_test_header(
        "test_upsert_updates_geometry_only",
        &["Upserting an existing parcel replaces geometry and keeps its owner"],
    );

    let (repos, ion, _) = seeded().await;

    println!("\n📝 Stage 1: Assign A1 to Ion");
    let outcome = repos
        .parcels
        .apply_assignment(&[assign("A1", None, Some(ion.id))])
        .await
        .expect("apply");
    assert_eq!(outcome, ApplyOutcome::Applied(1));

    println!("\n📝 Stage 2: Re-upload A1 with new geometry");
    let updated = repos
        .parcels
        .upsert_geometry(&ParcelGeometry {
            coordinates: square(26.0, 46.0, 0.002),
            ..geometry("A1", 4.25)
        })
        .await
        .expect("upsert");

    assert_eq!(updated.area, 4.25);
    assert_eq!(updated.coordinates, square(26.0, 46.0, 0.002));
    assert_eq!(updated.owner_id, Some(ion.id));
    assert_eq!(repos.parcels.list(None).await.expect("list").len(), 3);
}

#[tokio::test]
async fn test_guarded_apply_rolls_back_on_mismatch() {
    print_test_header(
        "test_guarded_apply_rolls_back_on_mismatch",
        &["One stale guard rejects the whole plan inside the transaction"],
    );

    let (repos, ion, maria) = seeded().await;
    repos
        .parcels
        .apply_assignment(&[assign("A3", None, Some(maria.id))])
        .await
        .expect("maria takes A3");

    println!("\n📝 Stage 1: Plan expects A3 to be unowned");
    let outcome = repos
        .parcels
        .apply_assignment(&[
            assign("A1", None, Some(ion.id)),
            assign("A2", None, Some(ion.id)),
            assign("A3", None, Some(ion.id)),
        ])
        .await
        .expect("apply");
    assert_eq!(outcome, ApplyOutcome::Stale(vec!["A3".to_string()]));

    println!("\n📝 Stage 2: Nothing from the plan was written");
    assert!(repos
        .parcels
        .list_by_owner(ion.id)
        .await
        .expect("owned")
        .is_empty());
    let a3 = repos
        .parcels
        .find_by_id("A3")
        .await
        .expect("find")
        .expect("present");
    assert_eq!(a3.owner_id, Some(maria.id));

    println!("\n📝 Stage 3: Guard matching the current holder applies");
    let outcome = repos
        .parcels
        .apply_assignment(&[
            assign("A1", None, Some(ion.id)),
            assign("A3", Some(maria.id), Some(ion.id)),
            ParcelUpdate {
                parcel_id: "A3".to_string(),
                role: AssignmentRole::Cultivator,
                expected: None,
                value: Some(ion.id),
            },
        ])
        .await
        .expect("apply");
    assert_eq!(outcome, ApplyOutcome::Applied(3));

    let owned: Vec<String> = repos
        .parcels
        .list_by_owner(ion.id)
        .await
        .expect("owned")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(owned, vec!["A1", "A3"]);
    let held = repos
        .parcels
        .find_held_by(VILLAGE, ion.id)
        .await
        .expect("held");
    assert_eq!(held.len(), 2);
}

#[tokio::test]
async fn test_deleting_farmer_nulls_parcel_references() {
    let (repos, ion, _) = seeded().await;
    repos
        .parcels
        .apply_assignment(&[
            assign("A1", None, Some(ion.id)),
            ParcelUpdate {
                parcel_id: "A2".to_string(),
                role: AssignmentRole::Cultivator,
                expected: None,
                value: Some(ion.id),
            },
        ])
        .await
        .expect("apply");

    repos.farmers.delete(ion.id).await.expect("delete");

    assert!(repos.farmers.find_by_id(ion.id).await.expect("find").is_none());
    for parcel in repos.parcels.list(None).await.expect("list") {
        assert_eq!(parcel.owner_id, None, "{}", parcel.id);
        assert_eq!(parcel.cultivator_id, None, "{}", parcel.id);
    }
}

#[tokio::test]
async fn test_mayor_status_round_trip() {
    let repos = land_registry::infra::storage::repositories(sqlite().await);
    let now = Utc::now();
    let mayor = Mayor {
        id: Uuid::new_v4(),
        name: "Gheorghe Stan".to_string(),
        village: VILLAGE.to_string(),
        email: "primar@valeamare.ro".to_string(),
        password_hash: "plain$mayor-pass".to_string(),
        subscription_status: SubscriptionStatus::Pending,
        subscription_end_date: None,
        created_at: now,
        updated_at: now,
    };
    repos.mayors.create(&mayor).await.expect("create");

    let updated = repos
        .mayors
        .update(&Mayor {
            subscription_status: SubscriptionStatus::Active,
            ..mayor.clone()
        })
        .await
        .expect("update");
    assert_eq!(updated.subscription_status, SubscriptionStatus::Active);

    let by_village = repos
        .mayors
        .find_by_village(VILLAGE)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(by_village.id, mayor.id);
    assert_eq!(by_village.subscription_status, SubscriptionStatus::Active);

    // One mayor per village
    let second = repos
        .mayors
        .create(&Mayor {
            id: Uuid::new_v4(),
            email: "other@valeamare.ro".to_string(),
            ..mayor
        })
        .await;
    assert!(second.is_err());
}

#[tokio::test]
async fn test_service_over_sqlite() {
    print_test_header(
        "test_service_over_sqlite",
        &["Ingest, assign, audit and clear through the service on SQLite"],
    );

    let repos = land_registry::infra::storage::repositories(sqlite().await);
    let service = Service::new(
        repos.clone(),
        Arc::new(PlainHasher),
        Arc::new(Wgs84Passthrough),
        ServiceOptions::default(),
    );

    println!("\n📝 Stage 1: Create farmer and ingest parcels");
    let ion = service
        .add_farmer(
            &admin(),
            NewFarmer {
                name: "Ion Popescu".to_string(),
                company_code: "RO1001".to_string(),
                village: VILLAGE.to_string(),
                email: Some("ion@example.ro".to_string()),
                phone: None,
                password: "secret-pass".to_string(),
                color: None,
            },
        )
        .await
        .expect("farmer");

    let rows: Vec<RawParcelRow> = ["A1", "A2", "A3"]
        .iter()
        .enumerate()
        .map(|(i, id)| RawParcelRow {
            id: id.to_string(),
            village: VILLAGE.to_string(),
            area: 1.0 + i as f64,
            ring: square(25.0 + i as f64 * 0.01, 45.0, 0.002),
        })
        .collect();
    let batch = service
        .ingest_parcel_batch(&admin(), rows)
        .await
        .expect("batch");
    assert_eq!(batch.processed_count, 3);

    println!("\n📝 Stage 2: Assign and reassign");
    let first = service
        .assign_parcels(
            &admin(),
            &AssignmentRequest::new(ion.id, ["A1", "A2"], ["A2"]),
            false,
        )
        .await
        .expect("assign");
    assert!(matches!(first, AssignmentOutcome::Committed(ref s) if s.changes == 3));

    let second = service
        .assign_parcels(
            &admin(),
            &AssignmentRequest::new(ion.id, ["A1", "A3"], Vec::<String>::new()),
            false,
        )
        .await
        .expect("reassign");
    assert!(matches!(second, AssignmentOutcome::Committed(ref s) if s.changes == 3));

    let owned: Vec<String> = service
        .parcels_by_owner(&admin(), ion.id)
        .await
        .expect("owned")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(owned, vec!["A1", "A3"]);
    assert!(service
        .parcels_by_cultivator(&admin(), ion.id)
        .await
        .expect("cultivated")
        .is_empty());

    println!("\n📝 Stage 3: Audit trail and settings");
    let assignments = service
        .list_logs(&admin(), Some(LogType::Assignment), 10)
        .await
        .expect("logs");
    assert_eq!(assignments.len(), 2);
    assert!(assignments.iter().all(|l| l.action == "Assigned Parcels"));

    service
        .update_site_name(&admin(), "Cadastru")
        .await
        .expect("site name");
    service
        .update_site_name(&admin(), "Cadastru Valea Mare")
        .await
        .expect("site name again");
    assert_eq!(
        service.site_settings().await.expect("settings").site_name,
        "Cadastru Valea Mare"
    );

    println!("\n📝 Stage 4: Clear application data");
    service.clear_application_data(&admin()).await.expect("clear");
    assert!(service
        .list_parcels(&admin(), None)
        .await
        .expect("parcels")
        .is_empty());
    assert!(service
        .list_farmers(&admin(), None)
        .await
        .expect("farmers")
        .is_empty());
    let total = service.list_logs(&admin(), None, 100).await.expect("logs");
    assert!(total
        .iter()
        .any(|l| l.action == "Cleared All Application Data"));
}
