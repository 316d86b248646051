pub mod care_request;
pub mod elderly_profile;
pub mod user;

pub use care_request::{CareRequest, NewCareRequest, PatientDetails, RequestCreated, RequestStatus, Transition};
pub use elderly_profile::{
    Contact, ElderlyProfile, Medication, Metric, ProfileCollection, ProfileEntry, ProfileKey, Task,
};
pub use user::{NewUser, Role, User};
