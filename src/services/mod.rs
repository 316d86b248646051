pub mod access_guard;
pub mod auth_service;
pub mod profile_service;
pub mod request_service;
pub mod storage;

pub use access_guard::DataAccessGuard;
pub use auth_service::AuthGateway;
pub use profile_service::ProfileMutators;
pub use request_service::RequestLifecycle;
pub use storage::{DocumentStore, LocalObjectStore, ObjectStore, StorageError};
