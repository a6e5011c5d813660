//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    MockAccountCommand, MockAccountQuery, MockAdminCommand, MockAdminQuery,
    MockConsultationCommand, MockConsultationQuery, MockPetCommand, MockPetQuery,
    MockSlotAvailabilityQuery, MockSlotBookingCommand, TokenCodec, TokenError,
};
use crate::domain::{
    Account, AccountId, CONSULTATION_PRICE, Consultation, ConsultationId, ConsultationStatus,
    Identity, IssuedToken, MobileNumber, PersonName,
};
use crate::test_support::clock::fixture_timestamp;

use super::state::{HttpState, HttpStatePorts, UploadLimits};

/// `Authorization` value resolving to [`account_identity`].
pub const ACCOUNT_TOKEN: &str = "Bearer account-token";
/// `Authorization` value resolving to [`admin_identity`].
pub const ADMIN_TOKEN: &str = "Bearer admin-token";
/// `Authorization` value whose token has expired.
pub const EXPIRED_TOKEN: &str = "Bearer expired-token";

const ACCOUNT_UUID: Uuid = Uuid::from_u128(0x3fa8_5f64_5717_4562_b3fc_2c96_3f66_afa6);
const ACCOUNT_MOBILE: &str = "09121234567";
const ADMIN_MOBILE: &str = "09990000000";

pub fn account_id() -> AccountId {
    AccountId::from_uuid(ACCOUNT_UUID)
}

pub fn account_identity() -> Identity {
    Identity::Account {
        id: account_id(),
        mobile: MobileNumber::new(ACCOUNT_MOBILE).expect("fixture mobile"),
    }
}

pub fn admin_identity() -> Identity {
    Identity::Admin {
        mobile: MobileNumber::new(ADMIN_MOBILE).expect("fixture mobile"),
    }
}

/// The account behind [`ACCOUNT_TOKEN`].
pub fn account() -> Account {
    Account::new(
        account_id(),
        PersonName::new("Sara", "Ahmadi").expect("fixture name"),
        MobileNumber::new(ACCOUNT_MOBILE).expect("fixture mobile"),
        fixture_timestamp(),
    )
}

pub fn issued(token: &str) -> IssuedToken {
    IssuedToken {
        token: token.to_owned(),
        expires_at: fixture_timestamp() + Duration::days(7),
    }
}

pub fn timestamp() -> DateTime<Utc> {
    fixture_timestamp()
}

/// A consultation owned by [`account`] with no pet, slot, or files.
pub fn consultation(status: ConsultationStatus) -> Consultation {
    Consultation {
        id: ConsultationId::random(),
        account_id: account_id(),
        pet_id: None,
        description: "Coughing at night".to_owned(),
        price: CONSULTATION_PRICE,
        status,
        admin_response: None,
        responded_at: None,
        appointment: None,
        attachments: Vec::new(),
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

/// Token codec resolving the fixed test tokens.
struct StubTokenCodec;

impl TokenCodec for StubTokenCodec {
    fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        Ok(issued(&format!("token-for-{}", identity.mobile())))
    }

    fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        match token {
            "account-token" => Ok(account_identity()),
            "admin-token" => Ok(admin_identity()),
            "expired-token" => Err(TokenError::expired()),
            other => Err(TokenError::invalid(format!("unknown test token {other}"))),
        }
    }
}

/// Mock-backed HTTP state. Ports without expectations panic when called.
#[derive(Default)]
pub struct StateBuilder {
    pub accounts: MockAccountCommand,
    pub accounts_query: MockAccountQuery,
    pub pets: MockPetCommand,
    pub pets_query: MockPetQuery,
    pub consultations: MockConsultationCommand,
    pub consultations_query: MockConsultationQuery,
    pub slots: MockSlotBookingCommand,
    pub slots_query: MockSlotAvailabilityQuery,
    pub admin: MockAdminCommand,
    pub admin_query: MockAdminQuery,
    pub uploads: Option<UploadLimits>,
}

impl StateBuilder {
    pub fn build(self) -> HttpState {
        let state = HttpState::new(HttpStatePorts {
            accounts: Arc::new(self.accounts),
            accounts_query: Arc::new(self.accounts_query),
            pets: Arc::new(self.pets),
            pets_query: Arc::new(self.pets_query),
            consultations: Arc::new(self.consultations),
            consultations_query: Arc::new(self.consultations_query),
            slots: Arc::new(self.slots),
            slots_query: Arc::new(self.slots_query),
            admin: Arc::new(self.admin),
            admin_query: Arc::new(self.admin_query),
            tokens: Arc::new(StubTokenCodec),
        });
        match self.uploads {
            Some(limits) => state.with_upload_limits(limits),
            None => state,
        }
    }
}
