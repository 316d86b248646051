use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CareRequest, ElderlyProfile, NewCareRequest, NewUser, ProfileEntry, ProfileKey, RequestCreated,
    RequestStatus, Role, Transition, User,
};
use crate::database::repository::{
    CareRequestRepository, ProfileRepository, Store, StoreResult, UserRepository,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    requests: Vec<CareRequest>,
    /// Profiles in creation order
    profiles: Vec<ElderlyProfile>,
    profile_by_family: HashMap<String, Uuid>,
    /// Caretaker username -> bound profile ids, oldest first
    profiles_by_caretaker: HashMap<String, Vec<Uuid>>,
}

impl State {
    fn profile_mut(&mut self, id: Uuid) -> Option<&mut ElderlyProfile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    fn bind_caretaker(&mut self, family_username: &str, caretaker: &str) -> Option<Uuid> {
        let profile_id = *self.profile_by_family.get(family_username)?;
        let position = self.profiles.iter().position(|p| p.id == profile_id)?;
        let previous = self.profiles[position]
            .caretaker_username
            .replace(caretaker.to_string());

        if let Some(previous) = previous {
            if let Some(ids) = self.profiles_by_caretaker.get_mut(&previous) {
                ids.retain(|id| *id != profile_id);
            }
        }

        // Keep creation order so lookups pick the oldest profile
        let profiles = &self.profiles;
        let ids = self.profiles_by_caretaker.entry(caretaker.to_string()).or_default();
        let at = ids
            .iter()
            .position(|id| profiles.iter().position(|p| p.id == *id).unwrap_or(usize::MAX) > position)
            .unwrap_or(ids.len());
        ids.insert(at, profile_id);

        Some(profile_id)
    }

    fn lookup(&self, key: &ProfileKey) -> Option<Uuid> {
        match key {
            ProfileKey::Family(family) => self.profile_by_family.get(family).copied(),
            ProfileKey::Caretaker(caretaker) => self
                .profiles_by_caretaker
                .get(caretaker)
                .and_then(|ids| ids.first().copied()),
        }
    }
}

/// Process-local store used for development and tests.
///
/// Each operation runs under a single lock acquisition, so the multi-step
/// writes (request + profile, status + binding) are atomic here.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict(format!("email '{}' already registered", user.email)));
        }
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict(format!("username '{}' already taken", user.username)));
        }
        let user = user.into_user();
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|u| u.role == role).cloned().collect())
    }
}

#[async_trait]
impl CareRequestRepository for MemoryStore {
    async fn create_request(&self, request: NewCareRequest) -> StoreResult<RequestCreated> {
        let mut state = self.state.write().await;
        let request = request.into_request();
        state.requests.push(request.clone());

        let profile_created = if state.profile_by_family.contains_key(&request.family_username) {
            false
        } else {
            let profile = ElderlyProfile::seed(request.patient.clone(), request.family_username.clone());
            state.profile_by_family.insert(profile.family_username.clone(), profile.id);
            state.profiles.push(profile);
            true
        };

        Ok(RequestCreated { request, profile_created })
    }

    async fn find_request(&self, id: Uuid) -> StoreResult<Option<CareRequest>> {
        let state = self.state.read().await;
        Ok(state.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests_for(&self, username: &str) -> StoreResult<Vec<CareRequest>> {
        let state = self.state.read().await;
        Ok(state
            .requests
            .iter()
            .filter(|r| r.caretaker_username == username || r.family_username == username)
            .cloned()
            .collect())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        actor: &str,
    ) -> StoreResult<Transition> {
        let mut state = self.state.write().await;
        let Some(request) = state.requests.iter_mut().find(|r| r.id == id) else {
            return Ok(Transition::NotFound);
        };
        if request.caretaker_username != actor {
            return Ok(Transition::Forbidden {
                caretaker: request.caretaker_username.clone(),
            });
        }

        request.status = status;
        request.updated_at = Utc::now();
        let request = request.clone();

        let bound_profile = if status == RequestStatus::Accepted {
            state.bind_caretaker(&request.family_username, &request.caretaker_username)
        } else {
            None
        };

        Ok(Transition::Applied { request, bound_profile })
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_profile_for(&self, username: &str) -> StoreResult<Option<ElderlyProfile>> {
        let state = self.state.read().await;
        Ok(state
            .profiles
            .iter()
            .find(|p| p.family_username == username || p.caretaker_username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_profile_by_family(&self, family_username: &str) -> StoreResult<Option<ElderlyProfile>> {
        let state = self.state.read().await;
        let Some(id) = state.profile_by_family.get(family_username).copied() else {
            return Ok(None);
        };
        Ok(state.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn append_entry(&self, key: ProfileKey, entry: ProfileEntry) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(id) = state.lookup(&key) else {
            return Ok(false);
        };
        match state.profile_mut(id) {
            Some(profile) => {
                profile.push(entry);
                Ok(true)
            }
            None => Err(DatabaseError::Corrupt(format!("profile index points at missing profile {}", id))),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
