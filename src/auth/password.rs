use bcrypt::{hash, verify, BcryptError};
use thiserror::Error;

/// Longest input bcrypt consumes; anything longer would be silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Work factor used when `BCRYPT_COST` is unset.
pub const DEFAULT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password exceeds 72 bytes")]
    TooLong,
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] BcryptError),
    #[error("password worker failed: {0}")]
    Worker(String),
}

/// bcrypt hasher with a fixed work factor. The cost is embedded in each hash
/// (`$2b$<cost>$...`), so hashes made under an older cost keep verifying.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }
        Ok(hash(plaintext, self.cost)?)
    }

    /// Constant-time comparison is bcrypt's. Over-long input never matches.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, PasswordError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        Ok(verify(plaintext, hashed)?)
    }

    /// Runs `hash` on the blocking pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = *self;
        run_blocking(move || hasher.hash(&plaintext)).await
    }

    /// Runs `verify` on the blocking pool.
    pub async fn verify_blocking(
        &self,
        plaintext: String,
        hashed: String,
    ) -> Result<bool, PasswordError> {
        let hasher = *self;
        run_blocking(move || hasher.verify(&plaintext, &hashed)).await
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, PasswordError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PasswordError::Worker(e.to_string()))?
}
