use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Descriptive fields about the elderly person, shared by requests and profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub emergency_contact: String,
    pub address: String,
    pub condition: String,
    pub medical_history: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "declined" => Ok(RequestStatus::Declined),
            other => Err(format!("unknown request status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub patient: PatientDetails,
    pub family_username: String,
    pub caretaker_username: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCareRequest {
    pub patient: PatientDetails,
    pub family_username: String,
    pub caretaker_username: String,
}

impl NewCareRequest {
    pub fn into_request(self) -> CareRequest {
        let now = Utc::now();
        CareRequest {
            id: Uuid::new_v4(),
            patient: self.patient,
            family_username: self.family_username,
            caretaker_username: self.caretaker_username,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of persisting a request together with the profile get-or-create
#[derive(Debug, Clone)]
pub struct RequestCreated {
    pub request: CareRequest,
    pub profile_created: bool,
}

/// Outcome of a guarded status write
#[derive(Debug, Clone)]
pub enum Transition {
    NotFound,
    /// Acting identity is not the caretaker the request names
    Forbidden { caretaker: String },
    Applied {
        request: CareRequest,
        /// Profile whose caretaker was bound by this transition, if any
        bound_profile: Option<Uuid>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("accepted".parse::<RequestStatus>().unwrap(), RequestStatus::Accepted);
        assert_eq!(" Declined ".parse::<RequestStatus>().unwrap(), RequestStatus::Declined);
        assert!("archived".parse::<RequestStatus>().is_err());
        assert_eq!(RequestStatus::default(), RequestStatus::Pending);
    }
}
