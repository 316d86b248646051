use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::forms::Signup;
use crate::auth::{AuthError, PasswordHasher, TokenSigner};
use crate::database::models::{NewUser, Role, User};
use crate::database::{Store, UserRepository};
use crate::error::ApiError;

/// Issues and verifies bearer credentials for username/password accounts
pub struct AuthGateway {
    store: Arc<dyn Store>,
    signer: TokenSigner,
    hasher: PasswordHasher,
    /// Answer unknown email and wrong password identically
    uniform_errors: bool,
}

impl AuthGateway {
    pub fn new(store: Arc<dyn Store>, signer: TokenSigner, hasher: PasswordHasher, uniform_errors: bool) -> Self {
        Self {
            store,
            signer,
            hasher,
            uniform_errors,
        }
    }

    /// Create an account and return a credential bound to it
    pub async fn signup(&self, signup: Signup) -> Result<String, ApiError> {
        if self.store.find_user_by_email(&signup.email).await?.is_some() {
            return Err(ApiError::conflict("User already exist"));
        }
        if self.store.find_user_by_username(&signup.username).await?.is_some() {
            return Err(ApiError::conflict("Username already taken"));
        }

        let password_hash = self.hash_password(signup.password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                role: signup.role,
                username: signup.username,
                email: signup.email,
                telephone: signup.telephone,
                password_hash,
            })
            .await?;

        info!("Created {} account '{}' ({})", user.role, user.username, user.id);
        Ok(self.signer.issue(user.id)?)
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            warn!("Sign-in attempt for unknown email");
            return Err(if self.uniform_errors {
                ApiError::unauthorized("Invalid email or password")
            } else {
                ApiError::not_found("Email does not exist")
            });
        };

        if !self.verify_password(password.to_string(), user.password_hash.clone()).await? {
            warn!("Sign-in attempt with wrong password for '{}'", user.username);
            return Err(if self.uniform_errors {
                ApiError::unauthorized("Invalid email or password")
            } else {
                ApiError::unauthorized("Password is incorrect")
            });
        }

        Ok(self.signer.issue(user.id)?)
    }

    /// Verify a credential and yield the bound user id
    pub fn verify(&self, credential: Option<&str>) -> Result<Uuid, ApiError> {
        let token = credential.ok_or(AuthError::MissingToken)?;
        Ok(self.signer.verify(token)?)
    }

    pub async fn resolve_identity(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Public caretaker directory
    pub async fn list_caretakers(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.store.list_users_by_role(Role::Caretaker).await?)
    }

    // Argon2 is CPU-bound; keep it off the async workers
    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}
