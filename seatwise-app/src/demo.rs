//! Scripted walkthrough of the engine against the configured schedule.

use std::sync::Arc;

use anyhow::{bail, Context};
use seatwise_catalog::{FlightCatalog, FlightStatus};
use seatwise_core::BookingError;
use seatwise_order::{GroupBookingStore, GroupCommitError, GroupContact, Passenger, SeatChoice, Service};
use tracing::{info, warn};

use seatwise_app::AppState;

pub async fn run(state: &AppState) -> anyhow::Result<()> {
    let flights = state.catalog.flights();
    let Some(flight) = flights.first().cloned() else {
        bail!("no flights configured, add [[flights]] to config/default.toml");
    };

    for f in &flights {
        info!(
            "{} | {} | {} {} | ${:.2} | {} of {} seats free",
            f,
            f.airline(),
            f.departure_date(),
            f.departure_time(),
            f.current_price(),
            f.seats().available_count(),
            f.seats().capacity()
        );
    }

    let alice = Arc::new(Passenger::new("Alice"));
    let booking = match state
        .bookings
        .book_seat(&alice, &flight, SeatChoice::Next)
        .await
    {
        Ok(confirmation) => confirmation,
        Err(err @ BookingError::PaymentDeclined { .. }) => {
            warn!(error = %err, "payment declined, seat released");
            return Ok(());
        }
        Err(err) => return Err(err).context("booking failed"),
    };
    info!(receipt = %booking.receipt.receipt_number, "{} - ${:.2}", booking.description, booking.cost);

    match state
        .bookings
        .customize(&alice, booking.booking_id, &[Service::Insurance, Service::PriorityBoarding])
        .await
    {
        Ok(custom) => info!(charged = custom.charged, "{} - ${:.2}", custom.description, custom.cost),
        Err(err) => warn!(error = %err, "customization declined, booking unchanged"),
    }
    info!(
        points = alice.loyalty_points(),
        tier = %alice.loyalty_tier(),
        "loyalty status for {}",
        alice.name()
    );

    flight.set_status(FlightStatus::Delayed);
    flight.apply_discount(15.0)?;
    for notice in alice.inbox() {
        info!("inbox: {}", notice.message);
    }

    let record = alice
        .booking(booking.booking_id)
        .map(|b| b.record())
        .context("booking vanished")?;
    info!("record: {}", serde_json::to_string(&record)?);

    let group_flight = flights.get(1).cloned().unwrap_or_else(|| Arc::clone(&flight));
    let crew: Vec<Arc<Passenger>> = ["Bruno", "Chidi", "Dana", "Eli", "Farah"]
        .iter()
        .map(|name| Arc::new(Passenger::new(*name)))
        .collect();
    let mut group = state
        .bookings
        .start_group(
            &group_flight,
            &crew,
            GroupContact::new("Bruno", "bruno@example.com", "+1-555-0142"),
        )
        .await?;
    if let Err(err) = group.assign_seat(&crew[0], "1A") {
        warn!(error = %err, "could not pick 1A for the group lead");
    }
    if let Err(err) = group.auto_assign() {
        let released = state.bookings.abandon_group(group).await?;
        warn!(error = %err, released, "group could not be seated, abandoned");
    } else {
        let summary = group.to_string();
        match state.bookings.commit_group(group).await {
            Ok(id) => {
                info!("{summary}");
                state.bookings.leave_group(&id, &crew[4]).await?;
                if let Some(group) = state.groups.get(&id).await {
                    info!("after a cancellation: {group}");
                }
            }
            Err(GroupCommitError::Incomplete { group, source }) => {
                warn!(error = %source, "group incomplete, abandoning");
                state.bookings.abandon_group(*group).await?;
            }
            Err(GroupCommitError::Rejected(err)) => {
                warn!(error = %err, "group payment failed, seats released")
            }
        }
    }

    let today = chrono::Local::now().date_naive();
    let cancellation = state
        .bookings
        .cancel_booking(&alice, booking.booking_id, today)
        .await?;
    info!(
        refund = cancellation.refund,
        "cancelled {} on {}, refund ${:.2} of ${:.2} paid",
        cancellation.booking_id,
        cancellation.flight_number,
        cancellation.refund,
        cancellation.amount_paid
    );

    for f in state.catalog.flights() {
        info!(
            flight = f.number(),
            utilization = %format!("{:.0}%", f.seats().utilization() * 100.0),
            "final load"
        );
    }
    Ok(())
}
