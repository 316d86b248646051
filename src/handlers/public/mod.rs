// handlers/public/mod.rs - Endpoints reachable without a credential
//
// Token acquisition, the caretaker directory and service status.

pub mod auth;
pub mod status;

pub use auth::{caretakers_get, login_post, signup_post};
pub use status::{health_get, root_get};
