//! Port for issuing and verifying bearer credentials.
use crate::domain::{Identity, IssuedToken};

use super::define_port_error;

define_port_error! {
    /// Failures raised by token codecs.
    pub enum TokenError {
        /// Signature, structure, or claims were rejected.
        Invalid { message: String } => "invalid token: {message}",
        /// The token is past its expiry.
        Expired => "token expired",
        /// A token could not be produced.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// Signs identities into opaque bearer tokens and back.
///
/// Admin identities receive a different lifetime from account identities;
/// the codec owns both lifetimes.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError>;

    fn verify(&self, token: &str) -> Result<Identity, TokenError>;
}
