//! Builders wiring Diesel repositories and outbound adapters into the
//! HTTP state.

use std::sync::Arc;

use actix_web::web;

use vetconsult::domain::{
    AccountService, AdminService, ConsultationService, PetService, SlotBookingService,
};
use vetconsult::inbound::http::state::{HttpState, HttpStatePorts};
use vetconsult::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselAdminRepository, DieselConsultationRepository,
    DieselPetRepository, DieselSlotRepository,
};
use vetconsult::outbound::security::{Argon2PasswordHasher, JwtTokenCodec};
use vetconsult::outbound::storage::FsAttachmentStore;

use super::ServerConfig;

/// Repository adapters sharing one pool.
struct Repositories {
    accounts: Arc<DieselAccountRepository>,
    pets: Arc<DieselPetRepository>,
    consultations: Arc<DieselConsultationRepository>,
    slots: Arc<DieselSlotRepository>,
    admin: Arc<DieselAdminRepository>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            accounts: Arc::new(DieselAccountRepository::new(pool.clone())),
            pets: Arc::new(DieselPetRepository::new(pool.clone())),
            consultations: Arc::new(DieselConsultationRepository::new(pool.clone())),
            slots: Arc::new(DieselSlotRepository::new(pool.clone())),
            admin: Arc::new(DieselAdminRepository::new(pool.clone())),
        }
    }
}

/// Build the shared HTTP state from the configured adapters.
///
/// # Errors
/// Propagates [`std::io::Error`] when the upload directory cannot be opened.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let repos = Repositories::new(&config.db_pool);
    let clock = config.clock.clone();
    let tokens = Arc::new(JwtTokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.token_lifetimes,
        clock.clone(),
    ));
    let attachments = Arc::new(FsAttachmentStore::open(config.upload_dir.clone())?);

    let accounts = Arc::new(AccountService::new(
        repos.accounts.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        tokens.clone(),
        config.admin.clone(),
        clock.clone(),
    ));
    let pets = Arc::new(PetService::new(repos.pets.clone(), clock.clone()));
    let consultations = Arc::new(ConsultationService::new(
        repos.consultations.clone(),
        repos.pets.clone(),
        repos.slots.clone(),
        attachments,
        clock.clone(),
    ));
    let slots = Arc::new(SlotBookingService::new(
        repos.slots,
        repos.consultations.clone(),
    ));
    let admin = Arc::new(AdminService::new(
        repos.admin,
        repos.accounts,
        repos.pets,
        repos.consultations,
        clock,
    ));

    let state = HttpState::new(HttpStatePorts {
        accounts: accounts.clone(),
        accounts_query: accounts,
        pets: pets.clone(),
        pets_query: pets,
        consultations: consultations.clone(),
        consultations_query: consultations,
        slots: slots.clone(),
        slots_query: slots,
        admin: admin.clone(),
        admin_query: admin,
        tokens,
    })
    .with_upload_limits(config.upload_limits);

    Ok(web::Data::new(state))
}
