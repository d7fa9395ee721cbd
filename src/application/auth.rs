//! Accounts and cookie sessions.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{
    NewSessionParams, NewUserParams, RepoError, SessionsRepo, UsersRepo,
};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::users;

/// How long a login stays valid.
pub const SESSION_TTL: Duration = Duration::hours(24);

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email or username already exists")]
    AlreadyRegistered,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A freshly issued session. `token` is the cookie value; only its digest
/// is stored.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub token: String,
    pub user: UserRecord,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl AuthService {
    pub fn new(users: Arc<dyn UsersRepo>, sessions: Arc<dyn SessionsRepo>) -> Self {
        Self { users, sessions }
    }

    pub async fn signup(&self, input: SignupInput) -> Result<StartedSession, AuthError> {
        users::validate_signup(
            &input.username,
            &input.email,
            &input.password,
            &input.confirm_password,
        )?;
        let password_hash = hash_password(&input.password)?;
        let params = NewUserParams {
            username: input.username.trim().to_owned(),
            email: input.email.trim().to_owned(),
            password_hash,
        };
        let user = match self.users.create_user(params).await {
            Ok(user) => user,
            Err(RepoError::Duplicate { .. }) => return Err(AuthError::AlreadyRegistered),
            Err(err) => return Err(err.into()),
        };
        self.start_session(user).await
    }

    /// Login by email. The same error covers unknown addresses and wrong
    /// passwords.
    pub async fn login(&self, email: &str, password: &str) -> Result<StartedSession, AuthError> {
        let Some(user) = self.users.find_by_email(email.trim()).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&user.password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }
        self.start_session(user).await
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete_session(&token_digest(token)).await?;
        Ok(())
    }

    /// Maps a session cookie back to its account, if the session is still
    /// current.
    pub async fn resolve(&self, token: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self
            .sessions
            .find_user_by_token(&token_digest(token))
            .await?)
    }

    async fn start_session(&self, user: UserRecord) -> Result<StartedSession, AuthError> {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + SESSION_TTL;
        self.sessions
            .create_session(NewSessionParams {
                user_id: user.id,
                token_hash: token_digest(&token),
                expires_at,
            })
            .await?;
        Ok(StartedSession {
            token,
            user,
            expires_at,
        })
    }
}

fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn token_digest(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hashing(err.to_string()))
}

fn verify_password(stored: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hashing_round_trips() {
        let hash = hash_password("s3cretpw").unwrap();
        assert!(verify_password(&hash, "s3cretpw"));
        assert!(!verify_password(&hash, "wrong"));
        assert!(!verify_password("not-a-phc-string", "s3cretpw"));
    }

    #[test]
    fn tokens_are_long_and_digests_are_stable() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_eq!(token_digest(&token), token_digest(&token));
        assert_ne!(token_digest(&token), token_digest("other"));
    }
}
