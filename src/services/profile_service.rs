use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::forms::VitalsReading;
use crate::database::models::{Contact, Medication, Metric, ProfileEntry, ProfileKey, Task, User};
use crate::database::{ProfileRepository, Store};
use crate::error::ApiError;

/// Append-only writes into an elderly profile's collections.
///
/// Family members write tasks, medications and contacts into the profile
/// keyed by their username; metrics come from the bound caretaker.
pub struct ProfileMutators {
    store: Arc<dyn Store>,
}

impl ProfileMutators {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn add_task(&self, actor: &User, task: Task) -> Result<(), ApiError> {
        self.append_as_family(actor, ProfileEntry::Task(task)).await
    }

    pub async fn add_medication(&self, actor: &User, medication: Medication) -> Result<(), ApiError> {
        self.append_as_family(actor, ProfileEntry::Medication(medication)).await
    }

    pub async fn add_contact(&self, actor: &User, contact: Contact) -> Result<(), ApiError> {
        self.append_as_family(actor, ProfileEntry::Contact(contact)).await
    }

    /// Record a vitals reading, stamped with the current server time
    pub async fn add_metric(&self, actor: &User, reading: VitalsReading) -> Result<Metric, ApiError> {
        let metric = Metric {
            blood_pressure: reading.blood_pressure,
            heart_rate: reading.heart_rate,
            glucose_level: reading.glucose_level,
            timestamp: Utc::now(),
        };

        let key = ProfileKey::Caretaker(actor.username.clone());
        if !self.store.append_entry(key, ProfileEntry::Metric(metric.clone())).await? {
            warn!("'{}' recorded metrics without a bound profile", actor.username);
            return Err(ApiError::not_found("Elderly profile not found for this caretaker."));
        }

        debug!("Recorded metrics from caretaker '{}'", actor.username);
        Ok(metric)
    }

    async fn append_as_family(&self, actor: &User, entry: ProfileEntry) -> Result<(), ApiError> {
        let collection = entry.collection();
        let key = ProfileKey::Family(actor.username.clone());
        if !self.store.append_entry(key, entry).await? {
            return Err(ApiError::not_found("Elderly profile not found for this family member."));
        }

        debug!("Appended to {} of family '{}'", collection.column(), actor.username);
        Ok(())
    }
}
