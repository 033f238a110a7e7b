//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::DomainError;

/// In-memory implementation of UserRepository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
    /// Lowercased email -> user ID
    email_index: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    pub fn with_users(users: Vec<User>) -> Self {
        let mut users_map = HashMap::new();
        let mut email_map = HashMap::new();

        for user in users {
            let id = user.id().as_str().to_string();
            email_map.insert(normalize_email(user.email()), id.clone());
            users_map.insert(id, user);
        }

        Self {
            users: Arc::new(RwLock::new(users_map)),
            email_index: Arc::new(RwLock::new(email_map)),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(id.as_str()).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email_index = self.email_index.read().await;

        if let Some(user_id) = email_index.get(&normalize_email(email)) {
            let users = self.users.read().await;
            return Ok(users.get(user_id).cloned());
        }

        Ok(None)
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        let mut email_index = self.email_index.write().await;

        let id = user.id().as_str().to_string();
        let email = normalize_email(user.email());

        if users.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                id
            )));
        }

        if email_index.contains_key(&email) {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                user.email()
            )));
        }

        email_index.insert(email, id.clone());
        users.insert(id, user.clone());

        Ok(user)
    }

    async fn record_login(&self, id: &UserId) -> Result<(), DomainError> {
        let mut users = self.users.write().await;

        if let Some(user) = users.get_mut(id.as_str()) {
            user.record_login();
            Ok(())
        } else {
            Err(DomainError::not_found(format!("User '{}' not found", id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserRole;

    fn create_test_user(id: &str, email: &str) -> User {
        let user_id = UserId::new(id).unwrap();
        User::new(user_id, email, "Test User", "hash", UserRole::Customer)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("user-1", "jane@example.com");

        repo.create(user).await.unwrap();

        let id = UserId::new("user-1").unwrap();
        let found = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(found.email(), "jane@example.com");
    }

    #[tokio::test]
    async fn test_get_by_email_ignores_case() {
        let repo = InMemoryUserRepository::with_users(vec![create_test_user(
            "user-1",
            "Jane@Example.com",
        )]);

        let found = repo.get_by_email("jane@example.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id().as_str().to_string()), Some("user-1".to_string()));

        assert!(repo.get_by_email("john@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_and_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(create_test_user("user-1", "jane@example.com"))
            .await
            .unwrap();

        let same_id = repo
            .create(create_test_user("user-1", "other@example.com"))
            .await;
        assert!(matches!(same_id, Err(DomainError::Conflict { .. })));

        let same_email = repo
            .create(create_test_user("user-2", "JANE@example.com"))
            .await;
        assert!(matches!(same_email, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_record_login() {
        let repo = InMemoryUserRepository::with_users(vec![create_test_user(
            "user-1",
            "jane@example.com",
        )]);
        let id = UserId::new("user-1").unwrap();

        repo.record_login(&id).await.unwrap();

        let user = repo.get(&id).await.unwrap().unwrap();
        assert!(user.last_login_at().is_some());

        let missing = UserId::new("user-2").unwrap();
        assert!(repo.record_login(&missing).await.is_err());
    }
}
