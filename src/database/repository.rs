use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CareRequest, ElderlyProfile, NewCareRequest, NewUser, ProfileEntry, ProfileKey, RequestCreated,
    RequestStatus, Role, Transition, User,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DatabaseError::Conflict` when the username or email is taken
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait CareRequestRepository: Send + Sync {
    /// Persist a pending request and get-or-create the profile keyed by its
    /// family username.
    async fn create_request(&self, request: NewCareRequest) -> StoreResult<RequestCreated>;

    async fn find_request(&self, id: Uuid) -> StoreResult<Option<CareRequest>>;

    /// Requests naming `username` as either the caretaker or the family member
    async fn list_requests_for(&self, username: &str) -> StoreResult<Vec<CareRequest>>;

    /// Write `status` if `actor` is the request's caretaker; on `Accepted` bind
    /// that caretaker to the family's profile. Check, write and cascade happen
    /// as one unit.
    async fn transition_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        actor: &str,
    ) -> StoreResult<Transition>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Oldest profile whose caretaker or family username equals `username`
    async fn find_profile_for(&self, username: &str) -> StoreResult<Option<ElderlyProfile>>;

    async fn find_profile_by_family(&self, family_username: &str) -> StoreResult<Option<ElderlyProfile>>;

    /// Append to the located profile. Returns false when no profile matches.
    async fn append_entry(&self, key: ProfileKey, entry: ProfileEntry) -> StoreResult<bool>;
}

/// Everything the services need from persistence
#[async_trait]
pub trait Store: UserRepository + CareRequestRepository + ProfileRepository {
    async fn health_check(&self) -> StoreResult<()>;
}
