//! In-memory user store shared by the REST routes and the GraphQL resolvers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use trellis::{AppError, ApplicationError};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default)]
pub struct UserStore {
    next_id: AtomicU64,
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub async fn list(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    pub async fn find(&self, id: &str) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    pub async fn create(&self, new: NewUser) -> Result<User, AppError> {
        validate_email(&new.email)?;

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&new.email)) {
            return Err(ApplicationError::new("email already registered")
                .with_code("duplicate_email")
                .into());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let user = User { id: id.to_string(), name: new.name, email: new.email };
        users.push(user.clone());
        Ok(user)
    }
}

fn validate_email(email: &str) -> Result<(), ApplicationError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApplicationError::new("invalid email").with_code("invalid_email")),
    }
}

/// Per-request persistence context handed to resolvers.
#[derive(Clone)]
pub struct StoreContext {
    pub store: Arc<UserStore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser { name: "Ada".to_owned(), email: email.to_owned() }
    }

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let store = UserStore::default();
        let a = store.create(new_user("a@example.com")).await.unwrap();
        let b = store.create(new_user("b@example.com")).await.unwrap();

        assert_eq!((a.id.as_str(), b.id.as_str()), ("1", "2"));
        assert_eq!(store.find("2").await.unwrap().email, "b@example.com");
    }

    #[tokio::test]
    async fn rejects_bad_and_duplicate_emails_as_client_faults() {
        let store = UserStore::default();
        store.create(new_user("a@example.com")).await.unwrap();

        let bad = store.create(new_user("nope")).await.unwrap_err();
        let dup = store.create(new_user("A@example.com")).await.unwrap_err();

        assert!(bad.is_client());
        assert_eq!(bad.to_string(), "invalid email");
        assert!(dup.is_client());
        assert_eq!(store.list().await.len(), 1);
    }
}
