use std::sync::Arc;

use crate::database::models::{Contact, ElderlyProfile, Medication, Metric, Task, User};
use crate::database::{ProfileRepository, Store};
use crate::error::ApiError;

/// Resolves which elderly profile an identity may read.
///
/// A caller sees the profile it is bound to as caretaker or owns as family
/// member. Having no profile yet is the normal state before a request is
/// accepted, so reads then return empty collections.
pub struct DataAccessGuard {
    store: Arc<dyn Store>,
}

impl DataAccessGuard {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn profile_for(&self, identity: &User) -> Result<Option<ElderlyProfile>, ApiError> {
        Ok(self.store.find_profile_for(&identity.username).await?)
    }

    async fn read<T>(
        &self,
        identity: &User,
        select: impl FnOnce(ElderlyProfile) -> Vec<T>,
    ) -> Result<Vec<T>, ApiError> {
        Ok(self.profile_for(identity).await?.map(select).unwrap_or_default())
    }

    pub async fn tasks(&self, identity: &User) -> Result<Vec<Task>, ApiError> {
        self.read(identity, |profile| profile.tasks).await
    }

    pub async fn medications(&self, identity: &User) -> Result<Vec<Medication>, ApiError> {
        self.read(identity, |profile| profile.medications).await
    }

    pub async fn metrics(&self, identity: &User) -> Result<Vec<Metric>, ApiError> {
        self.read(identity, |profile| profile.metrics).await
    }

    pub async fn contacts(&self, identity: &User) -> Result<Vec<Contact>, ApiError> {
        self.read(identity, |profile| profile.contacts).await
    }
}
