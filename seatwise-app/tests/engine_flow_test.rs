use std::sync::Arc;

use seatwise_app::AppState;
use seatwise_catalog::{FlightCatalog, FlightStatus};
use seatwise_core::BookingError;
use seatwise_order::{
    BookingRecord, GroupBookingStore, GroupCommitError, GroupContact, GroupStatus, Passenger,
    ScriptedOutcome, ScriptedPaymentGateway, SeatChoice, Service,
};
use seatwise_store::Config;

const SCHEDULE: &str = r#"
    [seat_map]
    rows = 30
    columns = 7
    initial_occupancy = 0.0

    [payment]
    seed = 21

    [[flights]]
    number = "SW100"
    departure = "New York"
    arrival = "London"
    airline = "Seatwise Air"
    date = "2026-11-20"
    time = "09:30:00"
    duration_hours = 7.0
    price = 300.0

    [[flights]]
    number = "SW205"
    departure = "New York"
    arrival = "Paris"
    airline = "Seatwise Air"
    date = "2026-11-22"
    time = "18:15:00"
    duration_hours = 7.5
    price = 200.0
"#;

fn state(outcomes: &[ScriptedOutcome]) -> (AppState, Arc<ScriptedPaymentGateway>) {
    let gateway = Arc::new(ScriptedPaymentGateway::with_outcomes(outcomes.iter().copied()));
    let config = Config::from_toml(SCHEDULE).unwrap();
    let state = AppState::with_gateway(config, gateway.clone()).unwrap();
    (state, gateway)
}

fn contact() -> GroupContact {
    GroupContact::new("Lead", "lead@example.com", "555-0101")
}

#[tokio::test]
async fn test_booking_with_services_end_to_end() {
    let (state, gateway) = state(&[]);
    let flight = state.catalog.flight("sw100").unwrap();
    let alice = Arc::new(Passenger::new("Alice"));

    let booking = state
        .bookings
        .book_seat(&alice, &flight, SeatChoice::Code("1A".to_string()))
        .await
        .unwrap();
    let custom = state
        .bookings
        .customize(&alice, booking.booking_id, &[Service::Insurance, Service::PriorityBoarding])
        .await
        .unwrap();

    assert_eq!(custom.cost, 380.0);
    assert!(custom
        .description
        .ends_with("(Seat: 1A), with Insurance, with Priority Boarding"));
    assert_eq!(gateway.charges(), vec![300.0, 80.0]);
    assert_eq!(alice.loyalty_points(), 38);

    state.catalog.update_status("SW100", FlightStatus::Delayed).unwrap();
    let inbox = alice.inbox();
    assert_eq!(inbox.len(), 1);
    assert_eq!(
        inbox[0].message,
        "Flight SW100 (New York -> London) on 2026-11-20 status updated to: Delayed"
    );
}

#[tokio::test]
async fn test_record_restores_through_catalog() {
    let (state, _) = state(&[]);
    let flight = state.catalog.flight("SW205").unwrap();
    let bo = Arc::new(Passenger::new("Bo"));
    let booking = state.bookings.book_seat(&bo, &flight, SeatChoice::Next).await.unwrap();
    state
        .bookings
        .customize(&bo, booking.booking_id, &[Service::Meal])
        .await
        .unwrap();

    let json = serde_json::to_string(&bo.booking(booking.booking_id).unwrap().record()).unwrap();
    let record: BookingRecord = serde_json::from_str(&json).unwrap();
    let restored = record.restore(state.catalog.as_ref()).unwrap();

    assert_eq!(restored.cost(), 220.0);
    assert_eq!(restored.services(), vec![Service::Meal]);
    assert!(Arc::ptr_eq(restored.flight(), &flight));
    assert_eq!(flight.seats().occupied_count(), 1);
}

#[tokio::test]
async fn test_payment_failure_rolls_back_seat() {
    let (state, _) = state(&[ScriptedOutcome::Decline]);
    let flight = state.catalog.flight("SW100").unwrap();
    let alice = Arc::new(Passenger::new("Alice"));
    let seat = flight.seats().parse_seat_code("14F").unwrap();

    let err = state
        .bookings
        .book_seat(&alice, &flight, SeatChoice::Code("14F".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::PaymentDeclined { .. }));
    assert!(flight.seats().is_free(seat));
    assert!(alice.bookings().is_empty());
    assert_eq!(flight.subscriber_count(), 0);
}

#[tokio::test]
async fn test_five_passenger_group_total() {
    let (state, gateway) = state(&[]);
    let flight = state.catalog.flight("SW205").unwrap();
    let people: Vec<_> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|n| Arc::new(Passenger::new(*n)))
        .collect();

    let mut group = state
        .bookings
        .start_group(&flight, &people, contact())
        .await
        .unwrap();
    assert_eq!(group.subtotal(), 1000.0);
    assert_eq!(group.total_cost(), 900.0);

    for (person, seat) in people.iter().zip(["2A", "2B", "2C", "2E", "2F"]) {
        assert!(group.assign_seat(person, seat).unwrap());
    }
    let id = state.bookings.commit_group(group).await.unwrap();

    assert!(id.as_str().starts_with("GRP-"));
    assert_eq!(gateway.charges(), vec![900.0]);
    let stored = state.groups.get(&id).await.unwrap();
    assert_eq!(stored.status, GroupStatus::Committed);
    assert_eq!(state.groups.for_passenger("C").await.len(), 1);
    assert_eq!(flight.seats().occupied_count(), 5);
    assert_eq!(
        stored.to_string(),
        format!(
            "Group Booking {id}: 5 passengers for flight SW205 (New York to Paris) - Group Discount: 10.0% - Total Cost: $900.00"
        )
    );
}

#[tokio::test]
async fn test_group_payment_failure_leaves_no_seats() {
    let (state, _) = state(&[ScriptedOutcome::Fail]);
    let flight = state.catalog.flight("SW100").unwrap();
    let people: Vec<_> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| Arc::new(Passenger::new(*n)))
        .collect();

    let mut group = state
        .bookings
        .start_group(&flight, &people, contact())
        .await
        .unwrap();
    group.auto_assign().unwrap();
    assert_eq!(flight.seats().occupied_count(), 4);

    let err = state.bookings.commit_group(group).await.unwrap_err();

    assert!(matches!(
        err,
        GroupCommitError::Rejected(BookingError::PaymentDeclined { .. })
    ));
    assert_eq!(flight.seats().occupied_count(), 0);
    assert!(state.groups.all().await.is_empty());
    assert!(people.iter().all(|p| !flight.is_subscribed(p.name())));
}

#[tokio::test]
async fn test_incomplete_group_is_not_charged() {
    let (state, gateway) = state(&[]);
    let flight = state.catalog.flight("SW100").unwrap();
    let people: Vec<_> = ["A", "B"].iter().map(|n| Arc::new(Passenger::new(*n))).collect();

    let mut group = state
        .bookings
        .start_group(&flight, &people, contact())
        .await
        .unwrap();
    group.assign_seat(&people[0], "3A").unwrap();

    match state.bookings.commit_group(group).await {
        Err(GroupCommitError::Incomplete { group, source }) => {
            assert!(matches!(source, BookingError::GroupIncomplete { unassigned: 1, .. }));
            assert_eq!(state.bookings.abandon_group(*group).await.unwrap(), 1);
        }
        other => panic!("expected an incomplete group, got {other:?}"),
    }
    assert!(gateway.charges().is_empty());
    assert_eq!(flight.seats().occupied_count(), 0);
}

#[tokio::test]
async fn test_concurrent_bookings_never_share_a_seat() {
    let (state, _) = state(&[]);
    let flight = state.catalog.flight("SW100").unwrap();

    let mut tasks = Vec::new();
    for i in 0..24 {
        let bookings = Arc::clone(&state.bookings);
        let flight = Arc::clone(&flight);
        tasks.push(tokio::spawn(async move {
            let passenger = Arc::new(Passenger::new(format!("P{i}")));
            bookings
                .book_seat(&passenger, &flight, SeatChoice::Code("10C".to_string()))
                .await
                .is_ok()
        }));
    }

    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(flight.seats().occupied_count(), 1);
}

#[tokio::test]
async fn test_committed_group_keeps_its_seats() {
    let (state, _) = state(&[]);
    let flight = state.catalog.flight("SW100").unwrap();
    let people: Vec<_> = ["A", "B"].iter().map(|n| Arc::new(Passenger::new(*n))).collect();
    let mut group = state
        .bookings
        .start_group(&flight, &people, contact())
        .await
        .unwrap();
    group.assign_seat(&people[0], "1A").unwrap();
    group.assign_seat(&people[1], "1B").unwrap();
    let id = state.bookings.commit_group(group).await.unwrap();

    let stored = state.groups.get(&id).await.unwrap();
    assert_eq!(stored.status, GroupStatus::Committed);
    assert_eq!(stored.seat_assignments["A"].to_string(), "1A");
    let seat = flight.seats().parse_seat_code("1A").unwrap();
    assert!(!flight.seats().is_free(seat));
}

#[tokio::test]
async fn test_refund_uses_discounted_fare_paid() {
    let (state, gateway) = state(&[]);
    let flight = state.catalog.flight("SW100").unwrap();
    let alice = Arc::new(Passenger::new("Alice"));
    flight.apply_discount(50.0).unwrap();
    let booking = state
        .bookings
        .book_seat(&alice, &flight, SeatChoice::Next)
        .await
        .unwrap();
    flight.remove_special_offer();

    let today = chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
    let cancelled = state
        .bookings
        .cancel_booking(&alice, booking.booking_id, today)
        .await
        .unwrap();

    assert_eq!(gateway.charges(), vec![150.0]);
    assert_eq!(cancelled.refund, 150.0);
}
