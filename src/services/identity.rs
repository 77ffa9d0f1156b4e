//! Registration and login.
//!
//! Both "no such email" and "wrong password" produce the same `Unauthorized`
//! message, and the missing-user path still runs a bcrypt verification against a
//! dummy hash so the two paths take comparable time. Plaintext passwords and
//! hashes are never logged.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    normalize_email, AuthResponse, LoginRequest, PasswordHasher, RegisterRequest,
    SessionIssuer,
};
use crate::error::AppError;
use crate::models::{NewUser, PublicUser};
use crate::store::{StoreError, UserStore, EMAIL_TAKEN};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";

pub struct IdentityService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    sessions: SessionIssuer,
    dummy_hash: String,
}

impl IdentityService {
    /// Hashes a throwaway password once up front for the missing-user login path.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        sessions: SessionIssuer,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(&Uuid::new_v4().to_string())?;
        Ok(Self {
            users,
            hasher,
            sessions,
            dummy_hash,
        })
    }

    pub async fn register(&self, mut input: RegisterRequest) -> Result<PublicUser, AppError> {
        input.email = normalize_email(&input.email);
        input.validate()?;

        let email = input.email;
        if self.users.find_user_by_email(&email).await?.is_some() {
            log::info!("registration rejected: email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }

        let password_hash = self.hasher.hash_blocking(input.password).await?;
        let new_user = NewUser {
            id: Uuid::new_v4(),
            username: input.username.trim().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        };

        // The unique constraint is authoritative; a concurrent registration that
        // slipped past the pre-check lands here with the same Conflict.
        let user = match self.users.insert_user(new_user).await {
            Ok(user) => user,
            Err(StoreError::Conflict(_)) => {
                log::info!("registration rejected: email already registered (constraint)");
                return Err(AppError::Conflict(EMAIL_TAKEN.into()));
            }
            Err(other) => return Err(other.into()),
        };

        log::info!("registered user {}", user.id);
        Ok(user.into())
    }

    pub async fn login(&self, mut input: LoginRequest) -> Result<AuthResponse, AppError> {
        input.email = normalize_email(&input.email);
        input.validate()?;

        let user = self.users.find_user_by_email(&input.email).await?;

        let (stored_hash, user) = match user {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.clone(), None),
        };
        let matches = self
            .hasher
            .verify_blocking(input.password, stored_hash)
            .await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                log::debug!("login rejected for a submitted email");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
        };

        let token = self
            .sessions
            .issue(user.id, &user.email)
            .map_err(AppError::unavailable)?;

        log::info!("user {} logged in", user.id);
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Round-trips to the credential store.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.users.ping().await.map_err(AppError::from)
    }
}
