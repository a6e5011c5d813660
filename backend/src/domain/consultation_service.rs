//! Consultation submission and review services.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::account_service::missing_reference;
use crate::domain::pet_service::map_pet_repository_error;
use crate::domain::ports::{
    AttachmentStore, AttachmentStoreError, ConsultationCommand, ConsultationQuery,
    ConsultationRepository, ConsultationRepositoryError, ConsultationSubmission, PetRepository,
    PetSelection, SlotRepository, Upload,
};
use crate::domain::slot_booking_service::{map_slot_repository_error, reserve, slot_taken};
use crate::domain::{
    AccountId, Attachment, Consultation, ConsultationId, Error, NewConsultation, Pet, PetId,
    SlotReservation, StatusChange,
};

pub(crate) fn map_consultation_repository_error(error: ConsultationRepositoryError) -> Error {
    match error {
        ConsultationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("consultation repository unavailable: {message}"))
        }
        ConsultationRepositoryError::Query { message } => {
            Error::internal(format!("consultation repository error: {message}"))
        }
        ConsultationRepositoryError::MissingReference { constraint } => missing_reference(&constraint),
    }
}

fn map_store_error(error: AttachmentStoreError) -> Error {
    match error {
        AttachmentStoreError::Io { message } => {
            Error::internal(format!("attachment storage failed: {message}"))
        }
    }
}

fn consultation_not_found(id: ConsultationId) -> Error {
    Error::not_found(format!("consultation {id} not found"))
}

/// Consultation service implementing the command and query driving ports.
#[derive(Clone)]
pub struct ConsultationService<C, P, S, A> {
    consultation_repo: Arc<C>,
    pet_repo: Arc<P>,
    slot_repo: Arc<S>,
    attachments: Arc<A>,
    clock: Arc<dyn Clock>,
}

impl<C, P, S, A> ConsultationService<C, P, S, A> {
    pub fn new(
        consultation_repo: Arc<C>,
        pet_repo: Arc<P>,
        slot_repo: Arc<S>,
        attachments: Arc<A>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            consultation_repo,
            pet_repo,
            slot_repo,
            attachments,
            clock,
        }
    }
}

impl<C, P, S, A> ConsultationService<C, P, S, A>
where
    C: ConsultationRepository,
    P: PetRepository,
    S: SlotRepository,
    A: AttachmentStore,
{
    async fn resolve_pet(
        &self,
        owner: AccountId,
        selection: PetSelection,
    ) -> Result<Option<PetId>, Error> {
        match selection {
            PetSelection::Unspecified => Ok(None),
            PetSelection::Existing(id) => self
                .pet_repo
                .find_for_owner(owner, id)
                .await
                .map_err(map_pet_repository_error)?
                .map(|pet| Some(pet.id))
                .ok_or_else(|| Error::not_found(format!("pet {id} not found"))),
            PetSelection::New(profile) => {
                let pet = Pet {
                    id: PetId::random(),
                    owner,
                    profile,
                    created_at: self.clock.utc(),
                };
                self.pet_repo
                    .insert(&pet)
                    .await
                    .map_err(map_pet_repository_error)?;
                Ok(Some(pet.id))
            }
        }
    }

    async fn store_uploads(&self, uploads: Vec<Upload>) -> Result<Vec<Attachment>, Error> {
        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.attachments.store(upload).await {
                Ok(attachment) => stored.push(attachment),
                Err(err) => {
                    self.discard(&stored).await;
                    return Err(map_store_error(err));
                }
            }
        }
        Ok(stored)
    }

    async fn discard(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(err) = self.attachments.remove(attachment).await {
                warn!(stored_name = %attachment.stored_name, error = %err, "failed to remove upload");
            }
        }
    }

    /// Undo a consultation whose slot could not be reserved.
    async fn roll_back(&self, id: ConsultationId, attachments: &[Attachment]) {
        if let Err(err) = self.consultation_repo.delete(id).await {
            warn!(consultation_id = %id, error = %err, "failed to remove consultation after booking failure");
        }
        self.discard(attachments).await;
    }
}

#[async_trait]
impl<C, P, S, A> ConsultationCommand for ConsultationService<C, P, S, A>
where
    C: ConsultationRepository,
    P: PetRepository,
    S: SlotRepository,
    A: AttachmentStore,
{
    async fn submit(&self, submission: ConsultationSubmission) -> Result<Consultation, Error> {
        let ConsultationSubmission {
            account_id,
            pet,
            description,
            appointment,
            uploads,
        } = submission;

        if description.is_none() && uploads.is_empty() {
            return Err(
                Error::invalid_request("describe the problem or attach a recording")
                    .with_details(json!({ "field": "description", "code": "missing_field" })),
            );
        }

        if let Some(requested) = appointment {
            let held = self
                .slot_repo
                .find(requested.date, requested.time)
                .await
                .map_err(map_slot_repository_error)?
                .is_some_and(|row| !row.available);
            if held {
                return Err(slot_taken(
                    &requested.date.to_string(),
                    &requested.time.to_string(),
                ));
            }
        }

        let pet_id = self.resolve_pet(account_id, pet).await?;
        let attachments = self.store_uploads(uploads).await?;

        let new_consultation = NewConsultation {
            id: ConsultationId::random(),
            account_id,
            pet_id,
            description,
            appointment,
            attachments,
        };
        let consultation = match self.consultation_repo.insert(&new_consultation).await {
            Ok(consultation) => consultation,
            Err(err) => {
                self.discard(&new_consultation.attachments).await;
                return Err(map_consultation_repository_error(err));
            }
        };

        if let Some(requested) = appointment {
            let reservation = SlotReservation {
                date: requested.date,
                time: requested.time,
                account_id,
                consultation_id: Some(consultation.id),
            };
            if let Err(err) = reserve(self.slot_repo.as_ref(), &reservation).await {
                self.roll_back(consultation.id, &consultation.attachments)
                    .await;
                return Err(err);
            }
        }

        info!(
            consultation_id = %consultation.id,
            account_id = %account_id,
            attachments = consultation.attachments.len(),
            "consultation submitted"
        );
        Ok(consultation)
    }

    async fn change_status(
        &self,
        id: ConsultationId,
        change: StatusChange,
    ) -> Result<Consultation, Error> {
        let current = self
            .consultation_repo
            .find(id)
            .await
            .map_err(map_consultation_repository_error)?
            .ok_or_else(|| consultation_not_found(id))?;

        if current.status == change.status && change.admin_response.is_none() {
            return Ok(current);
        }
        if !current.status.can_transition_to(change.status) {
            return Err(Error::invalid_request(format!(
                "cannot move a {} consultation to {}",
                current.status, change.status
            ))
            .with_details(json!({
                "field": "status",
                "code": "invalid_transition",
                "value": change.status.as_str(),
            })));
        }

        let updated = self
            .consultation_repo
            .update_status(id, current.status, &change, self.clock.utc())
            .await
            .map_err(map_consultation_repository_error)?
            .ok_or_else(|| {
                Error::conflict(format!("consultation {id} was modified concurrently"))
            })?;

        info!(
            consultation_id = %id,
            from = %current.status,
            to = %updated.status,
            "consultation status changed"
        );
        Ok(updated)
    }
}

#[async_trait]
impl<C, P, S, A> ConsultationQuery for ConsultationService<C, P, S, A>
where
    C: ConsultationRepository,
    P: PetRepository,
    S: SlotRepository,
    A: AttachmentStore,
{
    async fn list_for_account(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Page<Consultation>, Error> {
        let counted = self
            .consultation_repo
            .list_for_account(account, page)
            .await
            .map_err(map_consultation_repository_error)?;
        Ok(Page::new(counted.rows, page, counted.total))
    }

    async fn get_for_account(
        &self,
        account: AccountId,
        id: ConsultationId,
    ) -> Result<Consultation, Error> {
        self.consultation_repo
            .find(id)
            .await
            .map_err(map_consultation_repository_error)?
            .filter(|consultation| consultation.account_id == account)
            .ok_or_else(|| consultation_not_found(id))
    }
}

#[cfg(test)]
#[path = "consultation_service_tests.rs"]
mod tests;
