//! Tests for [`PgPatientStore`] against a real database.
//!
//! Run with `DATABASE_URL` pointing at an empty, disposable PostgreSQL database:
//! `cargo test -p hospital-db -- --ignored`.

use db::{
    Error, NewPatient, PatientFilter, PatientStatus, PatientStore, PatientUpdate, PgPatientStore,
    dashboard::{self, DashboardOptions},
};
use serde_json::json;
use time::macros::date;

async fn store() -> PgPatientStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgPatientStore::connect(&url, 2).await.unwrap();
    store.migrate().await.unwrap();

    sqlx::query(r#"TRUNCATE "patients" RESTART IDENTITY"#)
        .execute(store.pool())
        .await
        .unwrap();

    store
}

fn new_patient(name: &str, condition: &str) -> NewPatient {
    NewPatient {
        name: Some(name.to_string()),
        age: Some(json!(54)),
        gender: Some("male".to_string()),
        contact: Some("555-0100".to_string()),
        condition: Some(condition.to_string()),
        room: Some("B-12".to_string()),
        admission_date: Some("2024-01-10".to_string()),
        ..NewPatient::default()
    }
}

// A single test keeps the shared table free of interleaving between tests.
#[tokio::test]
#[ignore = "requires a PostgreSQL database in DATABASE_URL"]
async fn patient_lifecycle() {
    let store = store().await;
    store.ping().await.unwrap();

    let created = store.create(&new_patient("A. Ng", "pneumonia")).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.status, PatientStatus::Admitted);
    assert_eq!(store.get(created.id).await.unwrap(), created);

    let err = store.discharge(created.id, Some(date!(2024 - 01 - 09))).await;
    assert!(matches!(err, Err(Error::Validation(_))));

    let discharged = store
        .discharge(created.id, Some(date!(2024 - 01 - 15)))
        .await
        .unwrap();
    assert_eq!(discharged.status, PatientStatus::Discharged);
    assert_eq!(discharged.discharge_date, Some(date!(2024 - 01 - 15)));

    let update = PatientUpdate {
        room: Some(String::new()),
        ..PatientUpdate::default()
    };
    let updated = store.update(created.id, &update).await.unwrap();
    assert_eq!(updated.room, None);
    assert_eq!(updated.status, PatientStatus::Discharged);

    let other = store.create(&new_patient("B. 50%", "flu")).await.unwrap();

    let found = store.list(&PatientFilter::with_search("50%")).await.unwrap();
    assert_eq!(found, [other.clone()]);

    let found = store.list(&PatientFilter::with_search("1")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 1);

    let admitted = store
        .list(&PatientFilter::with_status(PatientStatus::Admitted))
        .await
        .unwrap();
    assert_eq!(admitted, [other.clone()]);

    let summary = dashboard::build(&store, &DashboardOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.counts.total, 2);
    assert_eq!(summary.counts.discharged, 1);

    store.delete(other.id).await.unwrap();
    assert!(matches!(store.get(other.id).await, Err(Error::NotFound(_))));
    assert!(matches!(store.delete(other.id).await, Err(Error::NotFound(_))));
}
