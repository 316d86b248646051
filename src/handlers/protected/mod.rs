// handlers/protected/mod.rs - Endpoints that require a credential
//
// Every handler here runs behind jwt_auth_middleware and
// validate_user_middleware, so a ValidatedUser extension is always present.

pub mod identity;
pub mod profile;
pub mod requests;
pub mod upload;

pub use identity::credentials_get;
pub use profile::{
    contacts_get, contacts_post, medication_get, medication_post, metrics_get, metrics_post,
    tasks_get, tasks_post,
};
pub use requests::{requests_get, requests_post, status_put};
pub use upload::upload_post;
