//! Request bodies accepted by the HTTP surface.
//!
//! Clients send loosely typed JSON (numbers where strings are expected and
//! vice versa), so every form field is read through [`Field`] and checked for
//! presence before any service code runs.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::database::models::{
    Contact, Medication, NewCareRequest, PatientDetails, RequestStatus, Role, Task,
};
use crate::error::ApiError;

/// A JSON scalar that may be absent. Strings are trimmed and blank strings
/// count as missing; numbers are rendered as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Field(Option<Value>);

impl Field {
    pub fn text(&self) -> Option<String> {
        match &self.0 {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// String value exactly as sent; only absent, null or empty counts as missing
    pub fn raw(&self) -> Option<String> {
        match &self.0 {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Collects missing fields so one response can list all of them
#[derive(Default)]
struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    fn take(&mut self, name: &'static str, field: &Field) -> String {
        field.text().unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        })
    }

    fn take_raw(&mut self, name: &'static str, field: &Field) -> String {
        field.raw().unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        })
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::missing_fields(self.missing))
        }
    }
}

fn invalid(field: &str, reason: &str) -> ApiError {
    let mut field_errors = BTreeMap::new();
    field_errors.insert(field.to_string(), reason.to_string());
    ApiError::validation_error(format!("Invalid value for '{}'", field), Some(field_errors))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: Field,
    pub email: Field,
    pub telephone: Field,
    pub password: Field,
    pub role: Field,
}

#[derive(Debug, Clone)]
pub struct Signup {
    pub username: String,
    pub email: String,
    pub telephone: String,
    pub password: String,
    pub role: Role,
}

impl SignupForm {
    pub fn validate(self) -> Result<Signup, ApiError> {
        let mut required = Required::default();
        let username = required.take("username", &self.username);
        let email = required.take("email", &self.email);
        let telephone = required.take("telephone", &self.telephone);
        let password = required.take_raw("password", &self.password);
        let role = required.take("role", &self.role);
        required.finish()?;

        let role = role
            .parse::<Role>()
            .map_err(|_| invalid("role", "must be 'caretaker' or 'family'"))?;

        Ok(Signup {
            username,
            email,
            telephone,
            password,
            role,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigninForm {
    pub email: Field,
    pub password: Field,
}

impl SigninForm {
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut required = Required::default();
        let email = required.take("email", &self.email);
        let password = required.take_raw("password", &self.password);
        required.finish()?;
        Ok((email, password))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CareRequestForm {
    pub name: Field,
    pub age: Field,
    pub gender: Field,
    /// Emergency contact number
    pub number: Field,
    pub address: Field,
    pub conditions: Field,
    pub history: Field,
    pub caretaker: Field,
    pub family: Field,
}

impl CareRequestForm {
    pub fn validate(self) -> Result<NewCareRequest, ApiError> {
        let mut required = Required::default();
        let name = required.take("name", &self.name);
        let age = required.take("age", &self.age);
        let gender = required.take("gender", &self.gender);
        let emergency_contact = required.take("number", &self.number);
        let address = required.take("address", &self.address);
        let condition = required.take("conditions", &self.conditions);
        let medical_history = required.take("history", &self.history);
        let caretaker_username = required.take("caretaker", &self.caretaker);
        let family_username = required.take("family", &self.family);
        required.finish()?;

        let age = age
            .parse::<i32>()
            .ok()
            .filter(|age| *age >= 0)
            .ok_or_else(|| invalid("age", "must be a non-negative whole number"))?;

        Ok(NewCareRequest {
            patient: PatientDetails {
                name,
                age,
                gender,
                emergency_contact,
                address,
                condition,
                medical_history,
            },
            family_username,
            caretaker_username,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    pub status: Field,
}

impl StatusForm {
    pub fn validate(self) -> Result<RequestStatus, ApiError> {
        let status = self
            .status
            .text()
            .ok_or_else(|| ApiError::validation_error("Status is required", None))?;
        status
            .parse::<RequestStatus>()
            .map_err(|_| invalid("status", "must be one of pending, accepted, declined"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    pub title: Field,
    pub time: Field,
}

impl TaskForm {
    pub fn validate(self) -> Result<Task, ApiError> {
        let mut required = Required::default();
        let title = required.take("title", &self.title);
        let time = required.take("time", &self.time);
        required.finish()?;
        Ok(Task { title, time })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MedicationForm {
    pub name: Field,
    pub dosage: Field,
}

impl MedicationForm {
    pub fn validate(self) -> Result<Medication, ApiError> {
        let mut required = Required::default();
        let name = required.take("name", &self.name);
        let dosage = required.take("dosage", &self.dosage);
        required.finish()?;
        Ok(Medication { name, dosage })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub title: Field,
    pub number: Field,
}

impl ContactForm {
    pub fn validate(self) -> Result<Contact, ApiError> {
        let mut required = Required::default();
        let title = required.take("title", &self.title);
        let number = required.take("number", &self.number);
        required.finish()?;
        Ok(Contact { title, number })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetricForm {
    pub blood_pressure: Field,
    pub heart_rate: Field,
    pub glucose_level: Field,
}

/// Vital signs as submitted; the timestamp is assigned when stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitalsReading {
    pub blood_pressure: String,
    pub heart_rate: String,
    pub glucose_level: String,
}

impl MetricForm {
    pub fn validate(self) -> Result<VitalsReading, ApiError> {
        let mut required = Required::default();
        let blood_pressure = required.take("blood_pressure", &self.blood_pressure);
        let heart_rate = required.take("heart_rate", &self.heart_rate);
        let glucose_level = required.take("glucose_level", &self.glucose_level);
        required.finish()?;
        Ok(VitalsReading {
            blood_pressure,
            heart_rate,
            glucose_level,
        })
    }
}
