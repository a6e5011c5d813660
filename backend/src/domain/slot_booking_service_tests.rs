//! Tests for the slot booking service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rstest::{fixture, rstest};
use tokio::sync::Barrier;

use super::*;
use crate::domain::ports::{MockConsultationRepository, MockSlotRepository};
use crate::domain::{
    AccountId, Consultation, ConsultationId, ConsultationStatus, ErrorCode, MobileNumber,
    SLOTS_PER_DAY,
};

type Key = (SlotDate, TimeSlot);

/// Slot store whose write enforces uniqueness the way the database does.
#[derive(Default)]
struct InMemorySlotRepository {
    rows: Mutex<HashMap<Key, SlotRecord>>,
}

impl InMemorySlotRepository {
    fn row(&self, date: SlotDate, time: TimeSlot) -> Option<SlotRecord> {
        self.rows
            .lock()
            .expect("slot map lock")
            .get(&(date, time))
            .copied()
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn find_for_date(&self, date: SlotDate) -> Result<Vec<SlotRecord>, SlotRepositoryError> {
        let rows = self.rows.lock().expect("slot map lock");
        Ok(rows.values().filter(|row| row.date == date).copied().collect())
    }

    async fn find(
        &self,
        date: SlotDate,
        time: TimeSlot,
    ) -> Result<Option<SlotRecord>, SlotRepositoryError> {
        Ok(self.row(date, time))
    }

    async fn try_reserve(&self, reservation: &SlotReservation) -> Result<(), SlotRepositoryError> {
        let mut rows = self.rows.lock().expect("slot map lock");
        let key = (reservation.date, reservation.time);
        if rows.get(&key).is_some_and(|row| !row.available) {
            return Err(SlotRepositoryError::taken(
                reservation.date.to_string(),
                reservation.time.to_string(),
            ));
        }
        rows.insert(
            key,
            SlotRecord {
                date: reservation.date,
                time: reservation.time,
                available: false,
                account_id: Some(reservation.account_id),
                consultation_id: reservation.consultation_id,
            },
        );
        Ok(())
    }

    async fn release(
        &self,
        date: SlotDate,
        time: TimeSlot,
        holder: Option<AccountId>,
    ) -> Result<SlotRelease, SlotRepositoryError> {
        let mut rows = self.rows.lock().expect("slot map lock");
        match rows.get_mut(&(date, time)) {
            None => Ok(SlotRelease::NotFound),
            Some(row) if row.available => Ok(SlotRelease::AlreadyAvailable),
            Some(row) if holder.is_some_and(|id| row.account_id != Some(id)) => {
                Ok(SlotRelease::HeldByOther)
            }
            Some(row) => {
                row.available = true;
                row.account_id = None;
                row.consultation_id = None;
                Ok(SlotRelease::Released)
            }
        }
    }

    async fn booked(&self) -> Result<Vec<BookedSlot>, SlotRepositoryError> {
        Ok(Vec::new())
    }
}

/// Wraps the in-memory store so every caller passes the pre-check before any
/// caller writes, reproducing the check-then-act race.
struct RacingSlotRepository {
    inner: InMemorySlotRepository,
    barrier: Barrier,
}

#[async_trait]
impl SlotRepository for RacingSlotRepository {
    async fn find_for_date(&self, date: SlotDate) -> Result<Vec<SlotRecord>, SlotRepositoryError> {
        self.inner.find_for_date(date).await
    }

    async fn find(
        &self,
        date: SlotDate,
        time: TimeSlot,
    ) -> Result<Option<SlotRecord>, SlotRepositoryError> {
        let row = self.inner.find(date, time).await;
        self.barrier.wait().await;
        row
    }

    async fn try_reserve(&self, reservation: &SlotReservation) -> Result<(), SlotRepositoryError> {
        self.inner.try_reserve(reservation).await
    }

    async fn release(
        &self,
        date: SlotDate,
        time: TimeSlot,
        holder: Option<AccountId>,
    ) -> Result<SlotRelease, SlotRepositoryError> {
        self.inner.release(date, time, holder).await
    }

    async fn booked(&self) -> Result<Vec<BookedSlot>, SlotRepositoryError> {
        self.inner.booked().await
    }
}

fn service_over<S: SlotRepository>(
    repo: Arc<S>,
) -> SlotBookingService<S, MockConsultationRepository> {
    SlotBookingService::new(repo, Arc::new(MockConsultationRepository::new()))
}

fn reservation(account: AccountId, time: &str) -> SlotReservation {
    SlotReservation {
        date: SlotDate::parse("2025-01-10").expect("date"),
        time: TimeSlot::parse(time).expect("time"),
        account_id: account,
        consultation_id: None,
    }
}

fn account_identity(id: AccountId) -> Identity {
    Identity::Account {
        id,
        mobile: MobileNumber::new("09120000001").expect("mobile"),
    }
}

fn admin_identity() -> Identity {
    Identity::Admin {
        mobile: MobileNumber::new("09999999999").expect("mobile"),
    }
}

fn consultation_for(account: AccountId, id: ConsultationId) -> Consultation {
    let now = Utc::now();
    Consultation {
        id,
        account_id: account,
        pet_id: None,
        description: "limping".to_owned(),
        price: crate::domain::CONSULTATION_PRICE,
        status: ConsultationStatus::Pending,
        admin_response: None,
        responded_at: None,
        appointment: None,
        attachments: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

#[fixture]
fn store() -> Arc<InMemorySlotRepository> {
    Arc::new(InMemorySlotRepository::default())
}

#[rstest]
#[tokio::test]
async fn empty_store_reports_every_grid_slot_available(store: Arc<InMemorySlotRepository>) {
    let service = service_over(store);
    let slots = service
        .available_slots(SlotDate::parse("2025-01-10").expect("date"))
        .await
        .expect("availability");

    assert_eq!(slots.len(), SLOTS_PER_DAY);
    assert!(slots.iter().all(|slot| slot.available));
    assert_eq!(slots.first().map(|s| s.time.to_string()), Some("08:00".into()));
    assert_eq!(slots.last().map(|s| s.time.to_string()), Some("19:30".into()));
}

#[rstest]
#[tokio::test]
async fn booked_slot_shows_unavailable_afterwards(store: Arc<InMemorySlotRepository>) {
    let service = service_over(store);
    let request = reservation(AccountId::random(), "14:00");

    service.book(request).await.expect("booking succeeds");
    let slots = service
        .available_slots(request.date)
        .await
        .expect("availability");

    let unavailable: Vec<_> = slots.iter().filter(|slot| !slot.available).collect();
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable.first().map(|s| s.time), Some(request.time));
}

#[rstest]
#[tokio::test]
async fn rebooking_by_another_account_conflicts_and_keeps_holder(
    store: Arc<InMemorySlotRepository>,
) {
    let service = service_over(store.clone());
    let first = reservation(AccountId::random(), "14:00");
    let second = reservation(AccountId::random(), "14:00");

    service.book(first).await.expect("first booking");
    let err = service.book(second).await.expect_err("second booking conflicts");

    assert_eq!(err.code(), ErrorCode::Conflict);
    let row = store.row(first.date, first.time).expect("row exists");
    assert_eq!(row.account_id, Some(first.account_id));
    assert!(!row.available);
}

#[tokio::test]
async fn concurrent_bookings_leave_exactly_one_winner() {
    let repo = Arc::new(RacingSlotRepository {
        inner: InMemorySlotRepository::default(),
        barrier: Barrier::new(2),
    });
    let service = service_over(repo.clone());
    let a = reservation(AccountId::random(), "09:30");
    let b = reservation(AccountId::random(), "09:30");

    let (left, right) = tokio::join!(service.book(a), service.book(b));

    let outcomes = [left, right];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(err) if err.code() == ErrorCode::Conflict))
        .count();
    assert_eq!((wins, conflicts), (1, 1));

    let holder = repo.inner.row(a.date, a.time).and_then(|row| row.account_id);
    assert!(holder == Some(a.account_id) || holder == Some(b.account_id));
}

#[rstest]
#[tokio::test]
async fn releasing_clears_references_and_is_idempotent(store: Arc<InMemorySlotRepository>) {
    let service = service_over(store.clone());
    let account = AccountId::random();
    let request = reservation(account, "10:00");
    service.book(request).await.expect("booking");

    let caller = account_identity(account);
    service
        .release(request.date, request.time, &caller)
        .await
        .expect("first release");
    service
        .release(request.date, request.time, &caller)
        .await
        .expect("second release is a no-op");

    let row = store.row(request.date, request.time).expect("row kept");
    assert!(row.available);
    assert_eq!(row.account_id, None);
    assert_eq!(row.consultation_id, None);
}

#[rstest]
#[tokio::test]
async fn releasing_unknown_slot_is_not_found(store: Arc<InMemorySlotRepository>) {
    let service = service_over(store);
    let request = reservation(AccountId::random(), "11:00");

    let err = service
        .release(request.date, request.time, &admin_identity())
        .await
        .expect_err("no row");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(false, Some(ErrorCode::Forbidden))]
#[case(true, None)]
#[tokio::test]
async fn releasing_another_accounts_slot_needs_admin(
    store: Arc<InMemorySlotRepository>,
    #[case] as_admin: bool,
    #[case] expected: Option<ErrorCode>,
) {
    let service = service_over(store.clone());
    let request = reservation(AccountId::random(), "12:30");
    service.book(request).await.expect("booking");

    let caller = if as_admin {
        admin_identity()
    } else {
        account_identity(AccountId::random())
    };
    let result = service.release(request.date, request.time, &caller).await;

    assert_eq!(result.err().map(|err| err.code()), expected);
    let available = store
        .row(request.date, request.time)
        .is_some_and(|row| row.available);
    assert_eq!(available, as_admin);
}

#[rstest]
#[tokio::test]
async fn release_after_the_slot_changed_hands_keeps_new_holder(
    store: Arc<InMemorySlotRepository>,
) {
    let service = service_over(store.clone());
    let original = AccountId::random();
    let successor = AccountId::random();
    let first = reservation(original, "13:00");
    service.book(first).await.expect("original booking");
    // The original holder frees the slot and someone else takes it before
    // the original holder's second release reaches the store.
    service
        .release(first.date, first.time, &account_identity(original))
        .await
        .expect("original release");
    service
        .book(reservation(successor, "13:00"))
        .await
        .expect("successor booking");

    let err = service
        .release(first.date, first.time, &account_identity(original))
        .await
        .expect_err("stale release is refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    let row = store.row(first.date, first.time).expect("row kept");
    assert!(!row.available);
    assert_eq!(row.account_id, Some(successor));
}

#[tokio::test]
async fn release_passes_caller_account_as_holder_and_none_for_admin() {
    let account = AccountId::random();
    let mut slots = MockSlotRepository::new();
    slots.expect_find().times(0);
    slots
        .expect_release()
        .withf(move |_, _, holder| *holder == Some(account))
        .times(1)
        .return_once(|_, _, _| Ok(SlotRelease::HeldByOther));
    slots
        .expect_release()
        .withf(|_, _, holder| holder.is_none())
        .times(1)
        .return_once(|_, _, _| Ok(SlotRelease::Released));
    let service = service_over(Arc::new(slots));
    let request = reservation(account, "08:30");

    let refused = service
        .release(request.date, request.time, &account_identity(account))
        .await
        .expect_err("held by someone else");
    service
        .release(request.date, request.time, &admin_identity())
        .await
        .expect("admin release");

    assert_eq!(refused.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn booking_with_foreign_consultation_is_not_found() {
    let owner = AccountId::random();
    let consultation_id = ConsultationId::random();
    let mut consultations = MockConsultationRepository::new();
    consultations
        .expect_find()
        .times(1)
        .return_once(move |id| Ok(Some(consultation_for(owner, id))));
    let mut slots = MockSlotRepository::new();
    slots.expect_try_reserve().times(0);

    let service = SlotBookingService::new(Arc::new(slots), Arc::new(consultations));
    let mut request = reservation(AccountId::random(), "15:00");
    request.consultation_id = Some(consultation_id);

    let err = service.book(request).await.expect_err("not owned");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn booking_with_own_consultation_records_it() {
    let owner = AccountId::random();
    let consultation_id = ConsultationId::random();
    let mut consultations = MockConsultationRepository::new();
    consultations
        .expect_find()
        .return_once(move |id| Ok(Some(consultation_for(owner, id))));
    let store = Arc::new(InMemorySlotRepository::default());

    let service = SlotBookingService::new(store.clone(), Arc::new(consultations));
    let mut request = reservation(owner, "15:00");
    request.consultation_id = Some(consultation_id);

    let record = service.book(request).await.expect("booked");
    assert_eq!(record.consultation_id, Some(consultation_id));
    assert_eq!(
        store
            .row(request.date, request.time)
            .and_then(|row| row.consultation_id),
        Some(consultation_id)
    );
}

#[rstest]
#[case(SlotRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(SlotRepositoryError::query("syntax"), ErrorCode::InternalError)]
#[case(SlotRepositoryError::taken("2025-01-10", "14:00"), ErrorCode::Conflict)]
#[case(
    SlotRepositoryError::missing_reference("appointment_slots_account_id_fkey"),
    ErrorCode::Unauthorized
)]
#[case(
    SlotRepositoryError::missing_reference("appointment_slots_consultation_id_fkey"),
    ErrorCode::NotFound
)]
#[tokio::test]
async fn repository_errors_map_to_domain_codes(
    #[case] failure: SlotRepositoryError,
    #[case] expected: ErrorCode,
) {
    let mut slots = MockSlotRepository::new();
    slots.expect_find().return_once(|_, _| Ok(None));
    slots.expect_try_reserve().return_once(move |_| Err(failure));

    let service = service_over(Arc::new(slots));
    let err = service
        .book(reservation(AccountId::random(), "14:00"))
        .await
        .expect_err("repository failure");

    assert_eq!(err.code(), expected);
}
