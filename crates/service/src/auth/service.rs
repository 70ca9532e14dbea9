use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};
use uuid::Uuid;

use models::user::{self, Role};

use super::domain::{
    AuthSession, AuthUser, ChangePasswordInput, Claims, LoginInput, NewAccount, RegisterInput, UpdateProfileInput,
};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub min_password_len: usize,
    pub password_algorithm: String,
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self { jwt_secret: secret.into(), token_ttl_hours: 24, min_password_len: 8, password_algorithm: "argon2".into() }
    }
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self {
            jwt_secret: c.jwt_secret.clone(),
            token_ttl_hours: c.token_ttl_hours,
            min_password_len: c.min_password_len,
            password_algorithm: "argon2".into(),
        }
    }
}

fn required(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password and sign them in.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::with_secret("secret"));
    /// let input = RegisterInput {
    ///     name: "Test".into(),
    ///     email: "user@example.com".into(),
    ///     password: "Secret123".into(),
    ///     role: "client".into(),
    ///     phone: "555-0100".into(),
    /// };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.user.email, "user@example.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        required("name", &input.name)?;
        required("email", &input.email)?;
        required("password", &input.password)?;
        required("role", &input.role)?;
        required("phone", &input.phone)?;
        let role = Role::parse(input.role.trim())?;
        user::validate_email(&input.email)?;
        self.check_password_len(&input.password)?;

        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = self.hash(&input.password)?;
        let user = self
            .repo
            .create_user(NewAccount { name: input.name, email: input.email, role, phone: input.phone })
            .await?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(event = "user_registered", user_id = %user.id, role = user.role.as_str(), "user registered");
        let token = self.issue_token(&user)?;
        Ok(AuthSession { user, token })
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::with_secret("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput {
    ///     name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into(),
    ///     role: "mechanic".into(), phone: "555-0101".into(),
    /// }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// let claims = svc.verify_token(&session.token).unwrap();
    /// assert_eq!(claims.email, "u@e.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        required("email", &input.email)?;
        required("password", &input.password)?;
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        self.verify_password(user.id, &input.password).await?;
        let token = self.issue_token(&user)?;
        info!(event = "user_logged_in", user_id = %user.id, "user logged in");
        Ok(AuthSession { user, token })
    }

    /// Decode and validate a bearer token.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if data.claims.user_id().is_none() {
            return Err(AuthError::InvalidToken("subject is not a user id".into()));
        }
        Ok(data.claims)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(user_id).await?.ok_or(AuthError::NotFound)
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(&self, user_id: Uuid, input: UpdateProfileInput) -> Result<AuthUser, AuthError> {
        if input.name.is_none() && input.phone.is_none() {
            return Err(AuthError::Validation("no updates provided".into()));
        }
        let updated = self.repo.update_user(user_id, input.name, input.phone).await?;
        info!(event = "profile_updated", user_id = %user_id, "profile updated");
        Ok(updated)
    }

    #[instrument(skip(self, input))]
    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> Result<(), AuthError> {
        required("current_password", &input.current_password)?;
        required("new_password", &input.new_password)?;
        self.check_password_len(&input.new_password)?;
        self.verify_password(user_id, &input.current_password).await?;
        let hash = self.hash(&input.new_password)?;
        self.repo.upsert_password(user_id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(event = "password_changed", user_id = %user_id, "password changed");
        Ok(())
    }

    fn check_password_len(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.cfg.min_password_len {
            return Err(AuthError::Validation(format!(
                "password too short (>={})",
                self.cfg.min_password_len
            )));
        }
        Ok(())
    }

    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string())
    }

    async fn verify_password(&self, user_id: Uuid, password: &str) -> Result<(), AuthError> {
        let cred = self.repo
            .get_credentials(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }
        Ok(())
    }

    fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
        let claims = Claims { sub: user.id.to_string(), email: user.email.clone(), role: user.role, exp };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::with_secret("test-secret"))
    }

    fn input(email: &str, role: &str) -> RegisterInput {
        RegisterInput {
            name: "Pat".into(),
            email: email.into(),
            password: "Password1".into(),
            role: role.into(),
            phone: "555-0100".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let svc = svc();
        let session = svc.register(input("pat@example.com", "client")).await.unwrap();
        let claims = svc.verify_token(&session.token).unwrap();
        assert_eq!(claims.user_id(), Some(session.user.id));
        assert_eq!(claims.role, Role::Client);

        let login = svc.login(LoginInput { email: "pat@example.com".into(), password: "Password1".into() }).await.unwrap();
        assert_eq!(login.user.id, session.user.id);
    }

    #[tokio::test]
    async fn register_rejects_missing_fields_and_bad_role() {
        let svc = svc();
        let mut missing_phone = input("a@example.com", "client");
        missing_phone.phone = "  ".into();
        assert!(matches!(svc.register(missing_phone).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.register(input("a@example.com", "admin")).await, Err(AuthError::Validation(_))));
        let mut short = input("a@example.com", "client");
        short.password = "short".into();
        assert!(matches!(svc.register(short).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let svc = svc();
        svc.register(input("dup@example.com", "client")).await.unwrap();
        let err = svc.register(input("DUP@example.com", "mechanic")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let svc = svc();
        svc.register(input("p@example.com", "client")).await.unwrap();
        let err = svc.login(LoginInput { email: "p@example.com".into(), password: "nope-nope".into() }).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
        let err = svc.login(LoginInput { email: "ghost@example.com".into(), password: "whatever1".into() }).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn change_password_requires_current() {
        let svc = svc();
        let s = svc.register(input("c@example.com", "client")).await.unwrap();
        let bad = ChangePasswordInput { current_password: "wrong-one".into(), new_password: "NewPassword1".into() };
        assert!(matches!(svc.change_password(s.user.id, bad).await, Err(AuthError::Unauthorized)));

        let good = ChangePasswordInput { current_password: "Password1".into(), new_password: "NewPassword1".into() };
        svc.change_password(s.user.id, good).await.unwrap();
        assert!(svc.login(LoginInput { email: "c@example.com".into(), password: "NewPassword1".into() }).await.is_ok());
    }

    #[tokio::test]
    async fn update_profile_needs_a_field() {
        let svc = svc();
        let s = svc.register(input("u@example.com", "client")).await.unwrap();
        assert!(matches!(
            svc.update_profile(s.user.id, UpdateProfileInput::default()).await,
            Err(AuthError::Validation(_))
        ));
        let updated = svc
            .update_profile(s.user.id, UpdateProfileInput { name: Some("Patricia".into()), phone: None })
            .await
            .unwrap();
        assert_eq!(updated.name, "Patricia");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let svc = svc();
        assert!(matches!(svc.verify_token("not.a.jwt"), Err(AuthError::InvalidToken(_))));
        let other = AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::with_secret("other"));
        let user = AuthUser { id: Uuid::new_v4(), name: "x".into(), email: "x@e.com".into(), role: Role::Client, phone: None };
        let token = other.issue_token(&user).unwrap();
        assert!(svc.verify_token(&token).is_err());
    }
}
