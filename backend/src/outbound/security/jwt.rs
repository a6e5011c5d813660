//! HS256 bearer tokens implementing the `TokenCodec` port.
//!
//! Claims carry the subject, mobile number, and role. Administrators use the
//! fixed subject `admin` because they have no account row.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{TokenCodec, TokenError};
use crate::domain::{AccountId, Identity, IssuedToken, MobileNumber};

const LEEWAY_SECS: u64 = 30;
const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    Account,
    Admin,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    mobile: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Validity windows per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub account: Duration,
    pub admin: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            account: Duration::hours(168),
            admin: Duration::hours(24),
        }
    }
}

/// JSON Web Token codec signed with a shared secret.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetimes: TokenLifetimes,
    clock: Arc<dyn Clock>,
}

impl JwtTokenCodec {
    pub fn new(secret: &[u8], lifetimes: TokenLifetimes, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECS;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetimes,
            clock,
        }
    }

    fn claims_for(&self, identity: &Identity, now: DateTime<Utc>) -> (Claims, DateTime<Utc>) {
        let (sub, role, ttl) = match identity {
            Identity::Account { id, .. } => (id.to_string(), Role::Account, self.lifetimes.account),
            Identity::Admin { .. } => (ADMIN_SUBJECT.to_owned(), Role::Admin, self.lifetimes.admin),
        };
        let expires_at = now + ttl;
        let claims = Claims {
            sub,
            mobile: identity.mobile().to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        (claims, expires_at)
    }
}

fn identity_from_claims(claims: Claims) -> Result<Identity, TokenError> {
    let mobile = MobileNumber::new(&claims.mobile)
        .map_err(|err| TokenError::invalid(format!("mobile claim: {err}")))?;
    match claims.role {
        Role::Admin if claims.sub == ADMIN_SUBJECT => Ok(Identity::Admin { mobile }),
        Role::Admin => Err(TokenError::invalid("admin token with account subject")),
        Role::Account => {
            let id = Uuid::parse_str(&claims.sub)
                .map_err(|err| TokenError::invalid(format!("subject claim: {err}")))?;
            Ok(Identity::Account {
                id: AccountId::from_uuid(id),
                mobile,
            })
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        let (claims, expires_at) = self.claims_for(identity, self.clock.utc());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::invalid(err.to_string()),
            }
        })?;
        identity_from_claims(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    use crate::test_support::clock::{fixture_clock, fixture_timestamp};

    const SECRET: &[u8] = b"test-secret-with-enough-entropy";

    #[fixture]
    fn codec() -> JwtTokenCodec {
        JwtTokenCodec::new(SECRET, TokenLifetimes::default(), Arc::new(DefaultClock))
    }

    fn account_identity() -> Identity {
        Identity::Account {
            id: AccountId::random(),
            mobile: MobileNumber::new("09121234567").expect("mobile"),
        }
    }

    fn admin_identity() -> Identity {
        Identity::Admin {
            mobile: MobileNumber::new("09990000000").expect("mobile"),
        }
    }

    #[rstest]
    #[case(account_identity(), Duration::hours(168))]
    #[case(admin_identity(), Duration::hours(24))]
    fn expiry_is_issue_time_plus_role_lifetime(#[case] identity: Identity, #[case] ttl: Duration) {
        let frozen = JwtTokenCodec::new(SECRET, TokenLifetimes::default(), fixture_clock());

        let issued = frozen.issue(&identity).expect("issued");

        assert_eq!(issued.expires_at, fixture_timestamp() + ttl);
    }

    #[rstest]
    #[case(account_identity())]
    #[case(admin_identity())]
    fn issued_tokens_verify_back_to_identity(codec: JwtTokenCodec, #[case] identity: Identity) {
        let issued = codec.issue(&identity).expect("issued");

        assert_eq!(codec.verify(&issued.token).expect("verified"), identity);
    }

    #[rstest]
    fn tokens_signed_with_another_secret_are_invalid(codec: JwtTokenCodec) {
        let other = JwtTokenCodec::new(b"other", TokenLifetimes::default(), Arc::new(DefaultClock));
        let token = other.issue(&account_identity()).expect("issued").token;

        assert!(matches!(codec.verify(&token), Err(TokenError::Invalid { .. })));
    }

    #[rstest]
    fn stale_tokens_are_expired(codec: JwtTokenCodec) {
        let past = JwtTokenCodec::new(SECRET, TokenLifetimes::default(), fixture_clock());
        let token = past.issue(&admin_identity()).expect("issued").token;

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[rstest]
    #[case("")]
    #[case("not.a.jwt")]
    fn garbage_is_invalid(codec: JwtTokenCodec, #[case] token: &str) {
        assert!(matches!(codec.verify(token), Err(TokenError::Invalid { .. })));
    }

    #[rstest]
    fn admin_role_requires_admin_subject() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            mobile: "09121234567".to_owned(),
            role: Role::Admin,
            iat: 0,
            exp: 0,
        };
        assert!(identity_from_claims(claims).is_err());
    }
}
