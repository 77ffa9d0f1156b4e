pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::PublicUser;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use token::{Claims, Identity, SessionIssuer, TokenError};

/// Represents the payload for a new user registration request.
///
/// Missing fields deserialize as empty strings so `validate()` reports them by
/// name.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    /// Display name, 3 to 50 characters once surrounding whitespace is trimmed.
    #[validate(custom = "validate_username")]
    pub username: String,
    /// Email address; compared and stored lower-cased.
    #[validate(email(message = "Please provide a valid email address."))]
    pub email: String,
    /// 8 to 72 characters, and no more than 72 bytes (bcrypt's input limit).
    #[validate(custom = "validate_new_password")]
    pub password: String,
}

/// Represents the payload for a user login request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Body of a successful registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: PublicUser,
}

/// Body of a successful login: the bearer token and the public user view.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Trims and lower-cases an email. Applied before validation, uniqueness checks
/// and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.trim().chars().count();
    if len < 3 {
        return Err(with_message(
            "length",
            "Username must be at least 3 characters long.",
        ));
    }
    if len > 50 {
        return Err(with_message(
            "length",
            "Username must be 50 characters or fewer.",
        ));
    }
    Ok(())
}

fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(with_message(
            "length",
            "Password must be at least 8 characters long.",
        ));
    }
    if password.chars().count() > 72 || password.len() > password::MAX_PASSWORD_BYTES {
        return Err(with_message(
            "length",
            "Password must be 72 characters or fewer (bcrypt limitation).",
        ));
    }
    Ok(())
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
