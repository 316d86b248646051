//! Store behaviour against a real Postgres database.
//!
//! Runs only when `DATABASE_URL` is set; otherwise each test returns early.
//! Usernames carry a random suffix so runs can share one database.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use carelink_api::database::models::{
    Medication, Metric, NewCareRequest, PatientDetails, ProfileEntry, ProfileKey, RequestStatus,
    Task, Transition,
};
use carelink_api::database::{CareRequestRepository, PgStore, ProfileRepository};

async fn store() -> Result<Option<PgStore>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return Ok(None);
    };
    let pool = PgPoolOptions::new().max_connections(4).connect(&url).await?;
    let store = PgStore::new(pool);
    store.migrate().await?;
    Ok(Some(store))
}

fn unique(name: &str) -> String {
    format!("{}_{}", name, &Uuid::new_v4().simple().to_string()[..12])
}

fn request(family: &str, caretaker: &str, patient: &str) -> NewCareRequest {
    NewCareRequest {
        patient: PatientDetails {
            name: patient.into(),
            age: 80,
            gender: "male".into(),
            emergency_contact: "5550199".into(),
            address: "1 Main St".into(),
            condition: "diabetes".into(),
            medical_history: "/uploads/history.pdf".into(),
        },
        family_username: family.into(),
        caretaker_username: caretaker.into(),
    }
}

fn metric(heart_rate: &str) -> ProfileEntry {
    ProfileEntry::Metric(Metric {
        blood_pressure: "120/80".into(),
        heart_rate: heart_rate.into(),
        glucose_level: "5.4".into(),
        timestamp: chrono::Utc::now(),
    })
}

#[tokio::test]
async fn create_is_pending_and_gets_or_creates_one_profile() -> Result<()> {
    let Some(store) = store().await? else { return Ok(()) };
    let alice = unique("alice");
    let carol = unique("carol");

    let first = store.create_request(request(&alice, &carol, "Bob")).await?;
    assert!(first.profile_created);
    assert_eq!(first.request.status, RequestStatus::Pending);

    let stored = store.find_request(first.request.id).await?.expect("request stored");
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(stored.patient.name, "Bob");

    let profile = store.find_profile_by_family(&alice).await?.expect("profile created");
    assert_eq!(profile.caretaker_username, None);
    assert!(profile.tasks.is_empty() && profile.metrics.is_empty());

    let second = store.create_request(request(&alice, &unique("dave"), "Robert")).await?;
    assert!(!second.profile_created);

    let profiles: i64 =
        sqlx::query_scalar("SELECT count(*) FROM elderly_profiles WHERE family_username = $1")
            .bind(&alice)
            .fetch_one(store.pool())
            .await?;
    assert_eq!(profiles, 1);

    // The first request's patient details stay on the profile
    let profile = store.find_profile_by_family(&alice).await?.expect("profile");
    assert_eq!(profile.patient.name, "Bob");
    assert_eq!(store.list_requests_for(&alice).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn accept_by_named_caretaker_binds_profile() -> Result<()> {
    let Some(store) = store().await? else { return Ok(()) };
    let alice = unique("alice");
    let carol = unique("carol");
    let id = store.create_request(request(&alice, &carol, "Bob")).await?.request.id;

    let Transition::Applied { request, bound_profile } =
        store.transition_status(id, RequestStatus::Accepted, &carol).await?
    else {
        panic!("expected the transition to apply");
    };
    assert_eq!(request.status, RequestStatus::Accepted);

    let profile = store.find_profile_by_family(&alice).await?.expect("profile");
    assert_eq!(bound_profile, Some(profile.id));
    assert_eq!(profile.caretaker_username.as_deref(), Some(carol.as_str()));
    assert_eq!(store.find_profile_for(&carol).await?.map(|p| p.id), Some(profile.id));
    Ok(())
}

#[tokio::test]
async fn other_caretaker_is_refused_and_nothing_changes() -> Result<()> {
    let Some(store) = store().await? else { return Ok(()) };
    let alice = unique("alice");
    let carol = unique("carol");
    let dave = unique("dave");
    let id = store.create_request(request(&alice, &carol, "Bob")).await?.request.id;

    match store.transition_status(id, RequestStatus::Accepted, &dave).await? {
        Transition::Forbidden { caretaker } => assert_eq!(caretaker, carol),
        other => panic!("expected Forbidden, got {:?}", other),
    }
    assert_eq!(store.find_request(id).await?.expect("request").status, RequestStatus::Pending);
    assert_eq!(store.find_profile_by_family(&alice).await?.expect("profile").caretaker_username, None);

    // Still guarded once the request is settled
    store.transition_status(id, RequestStatus::Accepted, &carol).await?;
    assert!(matches!(
        store.transition_status(id, RequestStatus::Declined, &dave).await?,
        Transition::Forbidden { .. }
    ));
    assert_eq!(store.find_request(id).await?.expect("request").status, RequestStatus::Accepted);
    let profile = store.find_profile_by_family(&alice).await?.expect("profile");
    assert_eq!(profile.caretaker_username.as_deref(), Some(carol.as_str()));

    assert!(matches!(
        store.transition_status(Uuid::new_v4(), RequestStatus::Accepted, &carol).await?,
        Transition::NotFound
    ));
    Ok(())
}

#[tokio::test]
async fn concurrent_transitions_leave_a_consistent_binding() -> Result<()> {
    let Some(store) = store().await? else { return Ok(()) };
    let store = std::sync::Arc::new(store);
    let alice = unique("alice");
    let carol = unique("carol");
    let id = store.create_request(request(&alice, &carol, "Bob")).await?.request.id;

    let mut handles = Vec::new();
    for n in 0..8 {
        let store = store.clone();
        let carol = carol.clone();
        let status = if n % 2 == 0 { RequestStatus::Accepted } else { RequestStatus::Declined };
        handles.push(tokio::spawn(async move {
            store.transition_status(id, status, &carol).await
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await??, Transition::Applied { .. }));
    }

    // Any accept in the batch binds the caretaker, whatever status ends last
    let profile = store.find_profile_by_family(&alice).await?.expect("profile");
    assert_eq!(profile.caretaker_username.as_deref(), Some(carol.as_str()));
    Ok(())
}

#[tokio::test]
async fn family_appends_keep_insertion_order() -> Result<()> {
    let Some(store) = store().await? else { return Ok(()) };
    let alice = unique("alice");
    store.create_request(request(&alice, &unique("carol"), "Bob")).await?;

    for title in ["Walk", "Lunch", "Nap"] {
        let task = ProfileEntry::Task(Task { title: title.into(), time: "09:00".into() });
        assert!(store.append_entry(ProfileKey::Family(alice.clone()), task).await?);
    }
    let medication = ProfileEntry::Medication(Medication { name: "Metformin".into(), dosage: "1/day".into() });
    assert!(store.append_entry(ProfileKey::Family(alice.clone()), medication).await?);

    let profile = store.find_profile_by_family(&alice).await?.expect("profile");
    let titles: Vec<&str> = profile.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Walk", "Lunch", "Nap"]);
    assert_eq!(profile.medications.len(), 1);
    assert!(profile.contacts.is_empty());

    let stranger = ProfileEntry::Task(Task { title: "Walk".into(), time: "09:00".into() });
    assert!(!store.append_entry(ProfileKey::Family(unique("nobody")), stranger).await?);
    Ok(())
}

#[tokio::test]
async fn caretaker_metrics_need_acceptance() -> Result<()> {
    let Some(store) = store().await? else { return Ok(()) };
    let alice = unique("alice");
    let carol = unique("carol");
    let id = store.create_request(request(&alice, &carol, "Bob")).await?.request.id;

    assert!(!store.append_entry(ProfileKey::Caretaker(carol.clone()), metric("70")).await?);

    store.transition_status(id, RequestStatus::Accepted, &carol).await?;
    assert!(store.append_entry(ProfileKey::Caretaker(carol.clone()), metric("70")).await?);
    assert!(store.append_entry(ProfileKey::Caretaker(carol.clone()), metric("72")).await?);

    let profile = store.find_profile_by_family(&alice).await?.expect("profile");
    let rates: Vec<&str> = profile.metrics.iter().map(|m| m.heart_rate.as_str()).collect();
    assert_eq!(rates, vec!["70", "72"]);
    Ok(())
}

#[tokio::test]
async fn caretaker_bound_twice_writes_to_oldest_profile() -> Result<()> {
    let Some(store) = store().await? else { return Ok(()) };
    let carol = unique("carol");
    let older = unique("alice");
    let newer = unique("erin");

    let first = store.create_request(request(&older, &carol, "Bob")).await?.request.id;
    let second = store.create_request(request(&newer, &carol, "Ann")).await?.request.id;
    store.transition_status(second, RequestStatus::Accepted, &carol).await?;
    store.transition_status(first, RequestStatus::Accepted, &carol).await?;

    let read = store.find_profile_for(&carol).await?.expect("profile");
    assert_eq!(read.family_username, older);

    assert!(store.append_entry(ProfileKey::Caretaker(carol.clone()), metric("70")).await?);

    let older_profile = store.find_profile_by_family(&older).await?.expect("profile");
    let newer_profile = store.find_profile_by_family(&newer).await?.expect("profile");
    assert_eq!(older_profile.metrics.len(), 1);
    assert!(newer_profile.metrics.is_empty());
    Ok(())
}
