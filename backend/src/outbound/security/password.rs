//! Argon2id implementation of the `PasswordHasher` port.
//!
//! Hashing is CPU-bound by design, so both operations run on the blocking
//! pool to keep async workers responsive.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Argon2id hasher with the crate's default cost parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, PasswordHashError>
where
    F: FnOnce() -> Result<T, PasswordHashError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| PasswordHashError::hash(format!("hashing task failed: {err}")))?
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        run_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|err| PasswordHashError::hash(err.to_string()))
        })
        .await
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let hash = hash.to_owned();
        run_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|err| PasswordHashError::malformed_hash(err.to_string()))?;
            match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(HashError::Password) => Ok(false),
                Err(err) => Err(PasswordHashError::hash(err.to_string())),
            }
        })
        .await
    }
}
