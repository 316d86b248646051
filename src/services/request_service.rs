use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{
    CareRequest, NewCareRequest, RequestCreated, RequestStatus, Role, Transition, User,
};
use crate::database::{CareRequestRepository, Store};
use crate::error::ApiError;

/// Care-request state machine: creation with profile get-or-create, and
/// caretaker-authorized status transitions that bind the caretaker on accept.
pub struct RequestLifecycle {
    store: Arc<dyn Store>,
}

impl RequestLifecycle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &User, request: NewCareRequest) -> Result<RequestCreated, ApiError> {
        if actor.role != Role::Family {
            warn!("'{}' ({}) tried to submit a care request", actor.username, actor.role);
            return Err(ApiError::forbidden("Only family members can submit care requests."));
        }

        let created = self.store.create_request(request).await?;
        info!(
            "Care request {} submitted by '{}' for caretaker '{}'",
            created.request.id, actor.username, created.request.caretaker_username
        );
        if created.profile_created {
            info!("Created elderly profile for family '{}'", created.request.family_username);
        }
        Ok(created)
    }

    /// Only the caretaker named on the request may change its status.
    /// Re-transitions out of accepted/declined are allowed.
    pub async fn update_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
        actor: &str,
    ) -> Result<CareRequest, ApiError> {
        match self.store.transition_status(request_id, status, actor).await? {
            Transition::NotFound => Err(ApiError::not_found("Request not found")),
            Transition::Forbidden { caretaker } => {
                warn!(
                    "'{}' tried to update request {} assigned to '{}'",
                    actor, request_id, caretaker
                );
                Err(ApiError::forbidden("You are not authorized to update this request."))
            }
            Transition::Applied { request, bound_profile } => {
                info!("Request {} is now {}", request.id, request.status);
                if status == RequestStatus::Accepted {
                    match bound_profile {
                        Some(profile_id) => info!(
                            "Bound caretaker '{}' to profile {} of family '{}'",
                            request.caretaker_username, profile_id, request.family_username
                        ),
                        None => warn!(
                            "Request {} accepted but family '{}' has no elderly profile",
                            request.id, request.family_username
                        ),
                    }
                }
                Ok(request)
            }
        }
    }

    pub async fn list_for(&self, identity: &User) -> Result<Vec<CareRequest>, ApiError> {
        Ok(self.store.list_requests_for(&identity.username).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewUser, PatientDetails};
    use crate::database::{MemoryStore, ProfileRepository};
    use axum::http::StatusCode;

    fn user(username: &str, role: Role) -> User {
        NewUser {
            role,
            username: username.into(),
            email: format!("{}@x.com", username),
            telephone: "5550100".into(),
            password_hash: String::new(),
        }
        .into_user()
    }

    fn bob_for(family: &str, caretaker: &str) -> NewCareRequest {
        NewCareRequest {
            patient: PatientDetails {
                name: "Bob".into(),
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

    fn lifecycle() -> (Arc<MemoryStore>, RequestLifecycle) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), RequestLifecycle::new(store))
    }

    #[tokio::test]
    async fn create_is_pending_and_profile_is_created_once() {
        let (store, lifecycle) = lifecycle();
        let alice = user("alice", Role::Family);

        let first = lifecycle.create(&alice, bob_for("alice", "carol")).await.unwrap();
        assert_eq!(first.request.status, RequestStatus::Pending);
        assert!(first.profile_created);

        let second = lifecycle.create(&alice, bob_for("alice", "dave")).await.unwrap();
        assert!(!second.profile_created);

        let profile = store.find_profile_by_family("alice").await.unwrap().unwrap();
        assert_eq!(profile.caretaker_username, None);
        assert_eq!(profile.patient.name, "Bob");
        assert_eq!(lifecycle.list_for(&alice).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn caretakers_cannot_create_requests() {
        let (_, lifecycle) = lifecycle();
        let carol = user("carol", Role::Caretaker);
        let err = lifecycle.create(&carol, bob_for("alice", "carol")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn accept_binds_the_named_caretaker() {
        let (store, lifecycle) = lifecycle();
        let alice = user("alice", Role::Family);
        let created = lifecycle.create(&alice, bob_for("alice", "carol")).await.unwrap();

        let request = lifecycle
            .update_status(created.request.id, RequestStatus::Accepted, "carol")
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);

        let profile = store.find_profile_by_family("alice").await.unwrap().unwrap();
        assert_eq!(profile.caretaker_username.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn other_identities_are_forbidden_and_nothing_changes() {
        let (store, lifecycle) = lifecycle();
        let alice = user("alice", Role::Family);
        let created = lifecycle.create(&alice, bob_for("alice", "carol")).await.unwrap();

        let err = lifecycle
            .update_status(created.request.id, RequestStatus::Accepted, "mallory")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "You are not authorized to update this request.");

        let request = store.find_request(created.request.id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        let profile = store.find_profile_by_family("alice").await.unwrap().unwrap();
        assert_eq!(profile.caretaker_username, None);
    }

    #[tokio::test]
    async fn settled_requests_stay_guarded() {
        let (store, lifecycle) = lifecycle();
        let alice = user("alice", Role::Family);
        let id = lifecycle.create(&alice, bob_for("alice", "carol")).await.unwrap().request.id;
        lifecycle.update_status(id, RequestStatus::Accepted, "carol").await.unwrap();

        for status in [RequestStatus::Declined, RequestStatus::Accepted, RequestStatus::Pending] {
            let err = lifecycle.update_status(id, status, "mallory").await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        }

        let request = store.find_request(id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);
        let profile = store.find_profile_by_family("alice").await.unwrap().unwrap();
        assert_eq!(profile.caretaker_username.as_deref(), Some("carol"));

        lifecycle.update_status(id, RequestStatus::Declined, "carol").await.unwrap();
        let err = lifecycle
            .update_status(id, RequestStatus::Accepted, "mallory")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let request = store.find_request(id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Declined);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let (_, lifecycle) = lifecycle();
        let err = lifecycle
            .update_status(Uuid::new_v4(), RequestStatus::Declined, "carol")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn decline_does_not_bind_and_terminal_states_can_be_left() {
        let (store, lifecycle) = lifecycle();
        let alice = user("alice", Role::Family);
        let id = lifecycle.create(&alice, bob_for("alice", "carol")).await.unwrap().request.id;

        lifecycle.update_status(id, RequestStatus::Declined, "carol").await.unwrap();
        let profile = store.find_profile_by_family("alice").await.unwrap().unwrap();
        assert_eq!(profile.caretaker_username, None);

        let request = lifecycle.update_status(id, RequestStatus::Accepted, "carol").await.unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);
        let profile = store.find_profile_by_family("alice").await.unwrap().unwrap();
        assert_eq!(profile.caretaker_username.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn caretaker_lists_requests_naming_them() {
        let (_, lifecycle) = lifecycle();
        let alice = user("alice", Role::Family);
        lifecycle.create(&alice, bob_for("alice", "carol")).await.unwrap();
        lifecycle.create(&alice, bob_for("alice", "dave")).await.unwrap();

        let carol = user("carol", Role::Caretaker);
        let requests = lifecycle.list_for(&carol).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].caretaker_username, "carol");
    }
}
