//! Port for one-way password hashing.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing or verification could not run.
        Hash { message: String } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted PHC string for the password.
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a password against a stored PHC string.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
