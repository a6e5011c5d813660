//! Credential adapters: bearer token codec and password hashing.

mod jwt;
mod password;

pub use jwt::{JwtTokenCodec, TokenLifetimes};
pub use password::Argon2PasswordHasher;
