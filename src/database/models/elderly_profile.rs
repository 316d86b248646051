use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::care_request::PatientDetails;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub title: String,
    pub number: String,
}

/// Vital-sign reading recorded by the bound caretaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub blood_pressure: String,
    pub heart_rate: String,
    pub glucose_level: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElderlyProfile {
    pub id: Uuid,
    #[serde(flatten)]
    pub patient: PatientDetails,
    pub family_username: String,
    pub caretaker_username: Option<String>,
    pub tasks: Vec<Task>,
    pub medications: Vec<Medication>,
    pub metrics: Vec<Metric>,
    pub contacts: Vec<Contact>,
    pub created_at: DateTime<Utc>,
}

impl ElderlyProfile {
    /// Fresh profile with no caretaker bound and empty collections
    pub fn seed(patient: PatientDetails, family_username: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient,
            family_username,
            caretaker_username: None,
            tasks: Vec::new(),
            medications: Vec::new(),
            metrics: Vec::new(),
            contacts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn push(&mut self, entry: ProfileEntry) {
        match entry {
            ProfileEntry::Task(task) => self.tasks.push(task),
            ProfileEntry::Medication(medication) => self.medications.push(medication),
            ProfileEntry::Metric(metric) => self.metrics.push(metric),
            ProfileEntry::Contact(contact) => self.contacts.push(contact),
        }
    }
}

/// The four append-only collections of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileCollection {
    Tasks,
    Medications,
    Metrics,
    Contacts,
}

impl ProfileCollection {
    pub fn column(&self) -> &'static str {
        match self {
            ProfileCollection::Tasks => "tasks",
            ProfileCollection::Medications => "medications",
            ProfileCollection::Metrics => "metrics",
            ProfileCollection::Contacts => "contacts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEntry {
    Task(Task),
    Medication(Medication),
    Metric(Metric),
    Contact(Contact),
}

impl ProfileEntry {
    pub fn collection(&self) -> ProfileCollection {
        match self {
            ProfileEntry::Task(_) => ProfileCollection::Tasks,
            ProfileEntry::Medication(_) => ProfileCollection::Medications,
            ProfileEntry::Metric(_) => ProfileCollection::Metrics,
            ProfileEntry::Contact(_) => ProfileCollection::Contacts,
        }
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            ProfileEntry::Task(v) => serde_json::to_value(v),
            ProfileEntry::Medication(v) => serde_json::to_value(v),
            ProfileEntry::Metric(v) => serde_json::to_value(v),
            ProfileEntry::Contact(v) => serde_json::to_value(v),
        }
    }
}

/// How a writer locates the profile it appends to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKey {
    Family(String),
    Caretaker(String),
}
