use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity role carried by every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "caregiver")]
    Caretaker,
    Family,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Caretaker => "caretaker",
            Role::Family => "family",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caretaker" | "caregiver" => Ok(Role::Caretaker),
            "family" => Ok(Role::Family),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    pub username: String,
    pub email: String,
    pub telephone: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Account about to be persisted; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub role: Role,
    pub username: String,
    pub email: String,
    pub telephone: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            role: self.role,
            username: self.username,
            email: self.email,
            telephone: self.telephone,
            password_hash: self.password_hash,
            created_at: Utc::now(),
        }
    }
}
