use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewAccount};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    /// Creates the user and, for mechanics, their empty profile.
    async fn create_user(&self, account: NewAccount) -> Result<AuthUser, AuthError>;
    async fn update_user(&self, id: Uuid, name: Option<String>, phone: Option<String>) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn poisoned<T>(_: T) -> AuthError { AuthError::Repository("mock lock poisoned".into()) }

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<Uuid, AuthUser>>,
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().map_err(poisoned)?;
            let email = email.trim().to_lowercase();
            Ok(users.values().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().map_err(poisoned)?;
            Ok(users.get(&id).cloned())
        }

        async fn create_user(&self, account: NewAccount) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().map_err(poisoned)?;
            let email = account.email.trim().to_lowercase();
            if users.values().any(|u| u.email == email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                name: account.name.trim().to_string(),
                email,
                role: account.role,
                phone: Some(account.phone),
            };
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update_user(&self, id: Uuid, name: Option<String>, phone: Option<String>) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().map_err(poisoned)?;
            let user = users.get_mut(&id).ok_or(AuthError::NotFound)?;
            if let Some(name) = name { user.name = name; }
            if let Some(phone) = phone { user.phone = Some(phone); }
            Ok(user.clone())
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().map_err(poisoned)?;
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().map_err(poisoned)?;
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }
    }
}
