//! Behavioural tests for slot booking over the Diesel adapters.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use vetconsult::domain::ports::{SlotAvailabilityQuery, SlotBookingCommand};
use vetconsult::domain::{
    AccountId, Error, ErrorCode, Identity, MobileNumber, SlotDate, SlotReservation,
    SlotBookingService, TimeSlot,
};
use vetconsult::outbound::persistence::{DieselConsultationRepository, DieselSlotRepository};

mod support;

use support::{TestDatabase, handle_cluster_setup_failure, seed_account, test_database};

const SLOT_DATE: &str = "2030-06-01";
const SLOT_TIME: &str = "10:00";
const FIRST_MOBILE: &str = "09121234567";
const SECOND_MOBILE: &str = "09351112233";
const ADMIN_MOBILE: &str = "09000000000";

type Service = SlotBookingService<DieselSlotRepository, DieselConsultationRepository>;

struct Backend {
    db: TestDatabase,
    service: Service,
    first: AccountId,
    second: AccountId,
}

struct SlotWorld {
    backend: Option<Backend>,
    booking: Option<Result<(), Error>>,
    release: Option<Result<(), Error>>,
}

impl SlotWorld {
    fn run<T>(&self, op: impl FnOnce(&Service) -> T) -> Option<T> {
        self.backend.as_ref().map(|backend| op(&backend.service))
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        let backend = self.backend.as_ref().expect("backend is ready");
        backend.db.runtime.block_on(future)
    }

    fn identity(&self, who: Who) -> Option<Identity> {
        let backend = self.backend.as_ref()?;
        let mobile = |raw: &str| MobileNumber::new(raw).expect("valid mobile");
        Some(match who {
            Who::First => Identity::Account {
                id: backend.first,
                mobile: mobile(FIRST_MOBILE),
            },
            Who::Second => Identity::Account {
                id: backend.second,
                mobile: mobile(SECOND_MOBILE),
            },
            Who::Admin => Identity::Admin {
                mobile: mobile(ADMIN_MOBILE),
            },
        })
    }
}

#[derive(Clone, Copy)]
enum Who {
    First,
    Second,
    Admin,
}

fn slot_date() -> SlotDate {
    SlotDate::parse(SLOT_DATE).expect("valid date")
}

fn slot_time() -> TimeSlot {
    TimeSlot::parse(SLOT_TIME).expect("valid time")
}

#[fixture]
fn world() -> SlotWorld {
    let setup = || -> Result<Backend, String> {
        let db = test_database()?;
        let first = seed_account(&db, "Sara", FIRST_MOBILE)?;
        let second = seed_account(&db, "Omid", SECOND_MOBILE)?;
        let service = SlotBookingService::new(
            Arc::new(DieselSlotRepository::new(db.pool.clone())),
            Arc::new(DieselConsultationRepository::new(db.pool.clone())),
        );
        Ok(Backend {
            db,
            service,
            first,
            second,
        })
    };
    let backend = match setup() {
        Ok(backend) => Some(backend),
        Err(reason) => handle_cluster_setup_failure(reason),
    };
    SlotWorld {
        backend,
        booking: None,
        release: None,
    }
}

fn book(world: &mut SlotWorld, who: Who) {
    let Some(Identity::Account { id, .. }) = world.identity(who) else {
        return;
    };
    let reservation = SlotReservation {
        date: slot_date(),
        time: slot_time(),
        account_id: id,
        consultation_id: None,
    };
    let outcome = world
        .run(|service| world.block_on(service.book(reservation)))
        .map(|result| result.map(|_| ()));
    world.booking = outcome;
}

fn release(world: &mut SlotWorld, who: Who) {
    let Some(caller) = world.identity(who) else {
        return;
    };
    let outcome =
        world.run(|service| world.block_on(service.release(slot_date(), slot_time(), &caller)));
    world.release = outcome;
}

fn slot_is_available(world: &SlotWorld) -> Option<bool> {
    let grid = world
        .run(|service| world.block_on(service.available_slots(slot_date())))?
        .expect("availability query succeeds");
    grid.iter()
        .find(|entry| entry.time == slot_time())
        .map(|entry| entry.available)
}

#[given("a slot booking service backed by PostgreSQL")]
fn a_slot_booking_service_backed_by_postgresql(world: &mut SlotWorld) {
    let _ = world;
}

#[given("the first account holds the 10:00 slot")]
fn the_first_account_holds_the_slot(world: &mut SlotWorld) {
    book(world, Who::First);
    if let Some(outcome) = world.booking.take() {
        outcome.expect("first booking succeeds");
    }
}

#[when("the first account books the 10:00 slot")]
fn the_first_account_books_the_slot(world: &mut SlotWorld) {
    book(world, Who::First);
}

#[when("the second account books the 10:00 slot")]
fn the_second_account_books_the_slot(world: &mut SlotWorld) {
    book(world, Who::Second);
}

#[when("the first account releases the 10:00 slot")]
fn the_first_account_releases_the_slot(world: &mut SlotWorld) {
    release(world, Who::First);
}

#[when("the second account releases the 10:00 slot")]
fn the_second_account_releases_the_slot(world: &mut SlotWorld) {
    release(world, Who::Second);
}

#[when("the administrator releases the 10:00 slot")]
fn the_administrator_releases_the_slot(world: &mut SlotWorld) {
    release(world, Who::Admin);
}

#[then("the booking succeeds")]
fn the_booking_succeeds(world: &mut SlotWorld) {
    if let Some(outcome) = world.booking.as_ref() {
        assert!(outcome.is_ok(), "booking failed: {outcome:?}");
    }
}

#[then("the booking is refused as a conflict")]
fn the_booking_is_refused_as_a_conflict(world: &mut SlotWorld) {
    if let Some(outcome) = world.booking.as_ref() {
        let err = outcome.as_ref().expect_err("booking should be refused");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }
}

#[then("the release is forbidden")]
fn the_release_is_forbidden(world: &mut SlotWorld) {
    if let Some(outcome) = world.release.as_ref() {
        let err = outcome.as_ref().expect_err("release should be refused");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}

#[then("the release succeeds")]
fn the_release_succeeds(world: &mut SlotWorld) {
    if let Some(outcome) = world.release.as_ref() {
        assert!(outcome.is_ok(), "release failed: {outcome:?}");
    }
}

#[then("the 10:00 slot is reported unavailable")]
fn the_slot_is_reported_unavailable(world: &mut SlotWorld) {
    if let Some(available) = slot_is_available(world) {
        assert!(!available);
    }
}

#[then("the 10:00 slot is reported available")]
fn the_slot_is_reported_available(world: &mut SlotWorld) {
    if let Some(available) = slot_is_available(world) {
        assert!(available);
    }
}

#[then("the other slots on that date are reported available")]
fn the_other_slots_are_reported_available(world: &mut SlotWorld) {
    let Some(grid) = world.run(|service| world.block_on(service.available_slots(slot_date())))
    else {
        return;
    };
    let grid = grid.expect("availability query succeeds");
    assert_eq!(grid.len(), 24);
    assert!(
        grid.iter()
            .filter(|entry| entry.time != slot_time())
            .all(|entry| entry.available)
    );
}

#[scenario(
    path = "tests/features/slot_booking.feature",
    name = "Booking a free slot marks it taken"
)]
fn booking_a_free_slot_marks_it_taken(world: SlotWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/slot_booking.feature",
    name = "A taken slot is refused"
)]
fn a_taken_slot_is_refused(world: SlotWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/slot_booking.feature",
    name = "Only the holder releases a slot"
)]
fn only_the_holder_releases_a_slot(world: SlotWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/slot_booking.feature",
    name = "An administrator releases any slot"
)]
fn an_administrator_releases_any_slot(world: SlotWorld) {
    drop(world);
}
