//! Integration tests for `DieselConsultationRepository` against embedded
//! PostgreSQL.

use chrono::Utc;
use rstest::{fixture, rstest};
use vetconsult::domain::ports::{
    ConsultationRepository, ConsultationRepositoryError, SlotRepository,
};
use vetconsult::domain::{
    AccountId, Appointment, ConsultationId, ConsultationStatus, NewConsultation, SlotDate,
    SlotReservation, StatusChange, TimeSlot,
};
use vetconsult::outbound::persistence::{DieselConsultationRepository, DieselSlotRepository};

mod support;

use support::{TestDatabase, handle_cluster_setup_failure, seed_account, test_database};

struct RepoContext {
    db: TestDatabase,
    consultations: DieselConsultationRepository,
    slots: DieselSlotRepository,
    owner: AccountId,
}

#[fixture]
fn repo_context() -> Option<RepoContext> {
    let setup = || -> Result<RepoContext, String> {
        let db = test_database()?;
        let owner = seed_account(&db, "Sara", "09121234567")?;
        Ok(RepoContext {
            consultations: DieselConsultationRepository::new(db.pool.clone()),
            slots: DieselSlotRepository::new(db.pool.clone()),
            db,
            owner,
        })
    };
    match setup() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn appointment() -> Appointment {
    Appointment {
        date: SlotDate::parse("2030-07-02").expect("valid date"),
        time: TimeSlot::parse("15:30").expect("valid time slot"),
    }
}

fn voice_only(account_id: AccountId) -> NewConsultation {
    NewConsultation {
        id: ConsultationId::random(),
        account_id,
        pet_id: None,
        description: None,
        appointment: Some(appointment()),
        attachments: Vec::new(),
    }
}

fn cancel() -> StatusChange {
    StatusChange {
        status: ConsultationStatus::Cancelled,
        admin_response: None,
    }
}

/// Store a consultation and hold its requested slot.
async fn booked(ctx: &RepoContext) -> ConsultationId {
    let stored = ctx
        .consultations
        .insert(&voice_only(ctx.owner))
        .await
        .expect("insert succeeds");
    ctx.slots
        .try_reserve(&SlotReservation {
            date: appointment().date,
            time: appointment().time,
            account_id: ctx.owner,
            consultation_id: Some(stored.id),
        })
        .await
        .expect("reservation succeeds");
    stored.id
}

#[rstest]
fn consultation_without_description_is_stored_empty(repo_context: Option<RepoContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: consultation_without_description_is_stored_empty skipped");
        return;
    };

    let stored = ctx
        .db
        .runtime
        .block_on(ctx.consultations.insert(&voice_only(ctx.owner)))
        .expect("insert succeeds");

    assert!(stored.description.is_empty());
    assert_eq!(stored.status, ConsultationStatus::Pending);
}

#[rstest]
fn cancelling_frees_the_held_slot(repo_context: Option<RepoContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: cancelling_frees_the_held_slot skipped");
        return;
    };

    let (updated, slot) = ctx.db.runtime.block_on(async {
        let id = booked(&ctx).await;
        let updated = ctx
            .consultations
            .update_status(id, ConsultationStatus::Pending, &cancel(), Utc::now())
            .await
            .expect("status update succeeds");
        let slot = ctx
            .slots
            .find(appointment().date, appointment().time)
            .await
            .expect("lookup succeeds");
        (updated, slot)
    });

    let updated = updated.expect("row matched");
    assert_eq!(updated.status, ConsultationStatus::Cancelled);
    let slot = slot.expect("slot row kept");
    assert!(slot.available);
    assert_eq!(slot.account_id, None);
    assert_eq!(slot.consultation_id, None);
}

#[rstest]
fn stale_cancellation_keeps_status_and_slot(repo_context: Option<RepoContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: stale_cancellation_keeps_status_and_slot skipped");
        return;
    };

    let (updated, stored, slot) = ctx.db.runtime.block_on(async {
        let id = booked(&ctx).await;
        let updated = ctx
            .consultations
            .update_status(id, ConsultationStatus::InReview, &cancel(), Utc::now())
            .await
            .expect("status update runs");
        let stored = ctx.consultations.find(id).await.expect("lookup succeeds");
        let slot = ctx
            .slots
            .find(appointment().date, appointment().time)
            .await
            .expect("lookup succeeds");
        (updated, stored, slot)
    });

    assert!(updated.is_none());
    assert_eq!(
        stored.map(|consultation| consultation.status),
        Some(ConsultationStatus::Pending)
    );
    let slot = slot.expect("slot row kept");
    assert!(!slot.available);
    assert_eq!(slot.account_id, Some(ctx.owner));
}

#[rstest]
fn insert_for_a_deleted_account_reports_missing_reference(repo_context: Option<RepoContext>) {
    let Some(ctx) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: insert_for_a_deleted_account_reports_missing_reference skipped"
        );
        return;
    };

    let err = ctx
        .db
        .runtime
        .block_on(ctx.consultations.insert(&voice_only(AccountId::random())))
        .expect_err("account row is missing");

    assert!(
        matches!(
            &err,
            ConsultationRepositoryError::MissingReference { constraint }
                if constraint.contains("account_id")
        ),
        "unexpected error: {err:?}"
    );
}
