//! User service for authentication and user management

use std::sync::Arc;

use tracing::debug;

use crate::domain::user::{
    validate_email, validate_password, User, UserId, UserRepository, UserRole,
};
use crate::domain::DomainError;

use super::password::{is_password_hash, PasswordHasher};

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    /// Stable identifier; generated when absent
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
}

/// User service for authentication and management
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    /// Create a new user
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        validate_email(&request.email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&request.password).map_err(|e| DomainError::validation(e.to_string()))?;

        let user_id = match request.id {
            Some(id) => UserId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))?,
            None => UserId::generate(),
        };

        let password_hash = self.hasher.hash(&request.password)?;

        let user = User::new(
            user_id,
            request.email,
            request.name,
            password_hash,
            request.role,
        );

        self.repository.create(user).await
    }

    /// Create a configured user whose password may already be hashed
    pub async fn seed(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        if !is_password_hash(&request.password) {
            return self.create(request).await;
        }

        validate_email(&request.email).map_err(|e| DomainError::validation(e.to_string()))?;

        let user_id = match request.id {
            Some(id) => UserId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))?,
            None => UserId::generate(),
        };

        let user = User::new(
            user_id,
            request.email,
            request.name,
            request.password,
            request.role,
        );

        self.repository.create(user).await
    }

    /// Authenticate a user with email and password
    ///
    /// Unknown email and wrong password are indistinguishable: both are `None`.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let user = match self.repository.get_by_email(email).await? {
            Some(u) => u,
            None => {
                debug!("Login attempt for unknown email");
                return Ok(None);
            }
        };

        if !self.hasher.verify(password, user.password_hash()) {
            debug!(user_id = %user.id(), "Login attempt with wrong password");
            return Ok(None);
        }

        self.repository.record_login(user.id()).await?;

        // Re-fetch user to get updated last_login_at
        self.repository.get(user.id()).await
    }

    /// Get a user by ID
    pub async fn get(&self, id: &str) -> Result<Option<User>, DomainError> {
        let user_id = UserId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))?;
        self.repository.get(&user_id).await
    }
}
