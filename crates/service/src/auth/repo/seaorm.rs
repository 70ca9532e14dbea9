use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;
use chrono::Utc;

use models::{mechanic, user, user_credentials};

use crate::auth::domain::{AuthUser, Credentials, NewAccount};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn repo_err(e: sea_orm::DbErr) -> AuthError { AuthError::Repository(e.to_string()) }

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_by_email(&self.db, email).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find_by_id(id).one(&self.db).await.map_err(repo_err)?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user(&self, account: NewAccount) -> Result<AuthUser, AuthError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        let created = user::create(&txn, &account.name, &account.email, account.role, &account.phone).await?;
        if account.role == user::Role::Mechanic {
            mechanic::create(&txn, created.id, mechanic::Profile::default()).await?;
        }
        txn.commit().await.map_err(repo_err)?;
        Ok(created.into())
    }

    async fn update_user(&self, id: Uuid, name: Option<String>, phone: Option<String>) -> Result<AuthUser, AuthError> {
        let found = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(AuthError::NotFound)?;
        let mut am: user::ActiveModel = found.into();
        if let Some(name) = name {
            user::validate_name(&name)?;
            am.name = Set(name.trim().to_string());
        }
        if let Some(phone) = phone {
            user::validate_phone(&phone)?;
            am.phone = Set(Some(phone.trim().to_string()));
        }
        am.updated_at = Set(Utc::now().into());
        let updated = am.update(&self.db).await.map_err(repo_err)?;
        Ok(updated.into())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }
}
