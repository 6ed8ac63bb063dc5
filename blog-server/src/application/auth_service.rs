use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::data::user_repository::{EMAIL_TAKEN, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{PublicUser, User};
use crate::infrastructure::security::{Claims, JwtKeys, hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Verified against when the email is unknown, so both failures cost one argon2 run.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("not-a-real-account-password").ok());

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
    allow_registration: bool,
}

/// A successful login: the public user and the token for the auth cookie.
#[derive(Debug)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys, allow_registration: bool) -> Self {
        Self {
            repo,
            keys,
            allow_registration,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<PublicUser, DomainError> {
        let email = email.trim().to_lowercase();
        let name = name.trim();
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(DomainError::validation("email, password and name are required"));
        }
        if !self.allow_registration {
            warn!(email = %email, "registration attempt while closed");
            return Err(DomainError::Forbidden("registration is closed".into()));
        }
        if self.repo.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "registration for existing email");
            return Err(DomainError::Conflict(EMAIL_TAKEN.into()));
        }

        let password = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|err| DomainError::Internal(err.to_string()))?
            .map_err(|err| DomainError::Internal(err.to_string()))?;

        let user = self
            .repo
            .create(User::new_admin(email, hash, name.to_string()))
            .await?;
        info!(user_id = %user.id, "user registered");
        Ok(user.to_public())
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(DomainError::validation("email and password are required"));
        }

        let user = self.repo.find_by_email(&email).await?;
        let hash = match &user {
            Some(user) => Some(user.password_hash.clone()),
            None => DUMMY_HASH.clone(),
        };

        let password = password.to_owned();
        let valid = tokio::task::spawn_blocking(move || {
            hash.is_some_and(|hash| verify_password(&password, &hash).unwrap_or(false))
        })
        .await
        .map_err(|err| DomainError::Internal(err.to_string()))?;

        let user = match user {
            Some(user) if valid => user,
            _ => {
                warn!(email = %email, reason = INVALID_CREDENTIALS, "login failed");
                return Err(DomainError::Unauthorized);
            }
        };

        let token = self.keys.issue(user.id, &user.email, user.role)?;
        info!(user_id = %user.id, "user logged in");
        Ok(Session {
            user: user.to_public(),
            token,
        })
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.repo.find_by_id(id).await
    }

    /// The account behind a verified token; gone accounts are unauthorized.
    pub async fn current_user(&self, claims: &Claims) -> Result<PublicUser, DomainError> {
        self.find_user(claims.sub)
            .await?
            .map(|user| user.to_public())
            .ok_or(DomainError::Unauthorized)
    }
}
