use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use seatwise_catalog::{discount_for, loyalty_points_for, Flight, SeatCode};
use seatwise_core::payment::PaymentReceipt;
use seatwise_core::{BookingError, BookingResult, Money};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::booking::Booking;
use crate::cancellation::refund_for;
use crate::component::{PricedComponent, Service};
use crate::group::{GroupBooking, GroupContact, GroupId, GroupStatus};
use crate::orchestrator::PaymentOrchestrator;
use crate::passenger::Passenger;
use crate::store::GroupBookingStore;

/// How the seat for a new booking is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatChoice {
    /// First free seat in scan order.
    Next,
    /// A specific seat such as "12B".
    Code(String),
}

#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub seat: SeatCode,
    pub cost: Money,
    pub description: String,
    pub points_earned: u64,
    pub receipt: PaymentReceipt,
}

#[derive(Debug, Clone)]
pub struct Customization {
    pub booking_id: Uuid,
    pub added: Vec<Service>,
    /// Only the difference between the new and the old cost.
    pub charged: Money,
    pub cost: Money,
    pub description: String,
    pub points_earned: u64,
    /// `None` when nothing had to be paid.
    pub receipt: Option<PaymentReceipt>,
}

#[derive(Debug, Clone)]
pub struct Cancellation {
    pub booking_id: Uuid,
    pub flight_number: String,
    pub seat: Option<SeatCode>,
    /// Current price of the cancelled chain.
    pub cost: Money,
    /// What was actually charged; the refund is a share of this.
    pub amount_paid: Money,
    pub refund: Money,
}

#[derive(Debug, thiserror::Error)]
pub enum GroupCommitError {
    /// Some members have no seat. The group comes back untouched so the
    /// caller can finish assignment or pass it to `abandon_group`.
    #[error("{source}")]
    Incomplete {
        source: BookingError,
        group: Box<GroupBooking>,
    },
    /// The group was discarded and any seats it held were released.
    #[error(transparent)]
    Rejected(BookingError),
}

impl GroupCommitError {
    pub fn booking_error(&self) -> &BookingError {
        match self {
            GroupCommitError::Incomplete { source, .. } => source,
            GroupCommitError::Rejected(err) => err,
        }
    }
}

/// Drives the payment-gated commit protocols for single and group bookings.
pub struct BookingService {
    payments: Arc<PaymentOrchestrator>,
    groups: Arc<dyn GroupBookingStore>,
    /// One async lock per booking being customized. Customizations of the
    /// same booking run one at a time.
    booking_locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl BookingService {
    pub fn new(payments: Arc<PaymentOrchestrator>, groups: Arc<dyn GroupBookingStore>) -> Self {
        Self {
            payments,
            groups,
            booking_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn groups(&self) -> &Arc<dyn GroupBookingStore> {
        &self.groups
    }

    /// Hold a seat, charge the fare, then attach the booking.
    ///
    /// The seat stays held while the payment is in flight. A declined
    /// payment releases it and leaves the passenger untouched.
    pub async fn book_seat(
        &self,
        passenger: &Arc<Passenger>,
        flight: &Arc<Flight>,
        choice: SeatChoice,
    ) -> BookingResult<BookingConfirmation> {
        let seat = self.hold_seat(flight, &choice)?;
        let mut booking = Booking::new(PricedComponent::reservation(
            Arc::clone(flight),
            passenger.name(),
            Some(seat),
        ));
        let cost = booking.cost();
        let description = booking.description();

        let receipt = match self.payments.charge(cost, &description).await {
            Ok(receipt) => receipt,
            Err(err) => {
                flight.seats().release(seat);
                warn!(passenger = passenger.name(), flight = flight.number(), seat = %seat, "booking rolled back, seat released");
                return Err(err);
            }
        };

        booking.record_payment(cost);
        let booking_id = booking.id;
        let points_earned = passenger.add_booking(booking);
        passenger.subscribe_to(flight);
        info!(
            passenger = passenger.name(),
            flight = flight.number(),
            seat = %seat,
            cost,
            points_earned,
            "booking committed"
        );

        Ok(BookingConfirmation {
            booking_id,
            seat,
            cost,
            description,
            points_earned,
            receipt,
        })
    }

    fn hold_seat(&self, flight: &Flight, choice: &SeatChoice) -> BookingResult<SeatCode> {
        match choice {
            SeatChoice::Next => flight
                .seats()
                .allocate_next()
                .ok_or_else(|| BookingError::FlightFull(flight.number().to_string())),
            SeatChoice::Code(code) => {
                let seat = flight.seats().parse_seat_code(code)?;
                if !flight.seats().allocate(seat)? {
                    return Err(BookingError::SeatUnavailable {
                        flight: flight.number().to_string(),
                        seat: seat.to_string(),
                    });
                }
                Ok(seat)
            }
        }
    }

    fn booking_lock(&self, booking_id: Uuid) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.booking_locks.lock().entry(booking_id).or_default())
    }

    /// Layer services over a committed booking and charge the difference.
    ///
    /// A declined payment strips the services again. Customizations of one
    /// booking are serialized, and the seat is never touched.
    pub async fn customize(
        &self,
        passenger: &Passenger,
        booking_id: Uuid,
        services: &[Service],
    ) -> BookingResult<Customization> {
        if services.is_empty() {
            let booking = passenger
                .booking(booking_id)
                .ok_or(BookingError::BookingNotFound(booking_id))?;
            return Ok(Customization {
                booking_id,
                added: Vec::new(),
                charged: 0.0,
                cost: booking.cost(),
                description: booking.description(),
                points_earned: 0,
                receipt: None,
            });
        }

        let lock = self.booking_lock(booking_id);
        let _serialized = lock.lock().await;

        let (old_cost, previous_services, upgraded) = passenger.update_booking(booking_id, |booking| {
            let old_cost = booking.cost();
            let previous_services = booking.services();
            let upgraded = booking.component().clone().wrap_all(services);
            booking.replace_component(upgraded.clone());
            (old_cost, previous_services, upgraded)
        })?;
        let new_cost = upgraded.cost();
        let description = upgraded.description();
        let delta = new_cost - old_cost;

        let receipt = match self.payments.charge(delta, &description).await {
            Ok(receipt) => receipt,
            Err(err) => {
                // Rebuilt over the live base so a seat change made meanwhile survives.
                let reverted = passenger.update_booking(booking_id, |booking| {
                    let current = booking.component();
                    let restored = PricedComponent::reservation(
                        Arc::clone(current.flight()),
                        current.passenger_name(),
                        current.seat(),
                    )
                    .wrap_all(&previous_services);
                    booking.replace_component(restored);
                });
                if let Err(revert) = reverted {
                    error!(passenger = passenger.name(), %booking_id, error = %revert, "could not revert customization");
                }
                warn!(passenger = passenger.name(), %booking_id, "customization reverted");
                return Err(err);
            }
        };

        if let Err(err) = passenger.update_booking(booking_id, |booking| booking.record_payment(delta)) {
            error!(passenger = passenger.name(), %booking_id, charged = delta, error = %err, "booking vanished after payment");
        }
        let points_earned = loyalty_points_for(delta);
        passenger.add_loyalty_points(points_earned);
        info!(passenger = passenger.name(), %booking_id, charged = delta, "booking customized");

        Ok(Customization {
            booking_id,
            added: services.to_vec(),
            charged: delta,
            cost: new_cost,
            description,
            points_earned,
            receipt: Some(receipt),
        })
    }

    /// Move a committed booking to another seat, keeping its services.
    pub fn change_seat(&self, passenger: &Passenger, booking_id: Uuid, code: &str) -> BookingResult<SeatCode> {
        let (previous, seat) = passenger.update_booking(booking_id, |booking| -> BookingResult<_> {
            let flight = Arc::clone(booking.flight());
            let seat = flight.seats().parse_seat_code(code)?;
            let previous = booking.seat();
            if !flight.seats().reassign(previous, seat)? {
                return Err(BookingError::SeatUnavailable {
                    flight: flight.number().to_string(),
                    seat: seat.to_string(),
                });
            }
            let moved = booking.component().with_seat(Some(seat));
            booking.replace_component(moved);
            Ok((previous, seat))
        })??;

        info!(passenger = passenger.name(), %booking_id, from = ?previous.map(|s| s.to_string()), to = %seat, "seat changed");
        Ok(seat)
    }

    /// Cancel a booking, free its seat and refund part of what was paid.
    ///
    /// The passenger stops following the flight once they hold neither a
    /// booking nor a group seat on it.
    pub async fn cancel_booking(
        &self,
        passenger: &Passenger,
        booking_id: Uuid,
        today: NaiveDate,
    ) -> BookingResult<Cancellation> {
        let booking = passenger
            .take_booking(booking_id)
            .ok_or(BookingError::BookingNotFound(booking_id))?;
        self.booking_locks.lock().remove(&booking_id);
        let flight = Arc::clone(booking.flight());

        if let Some(seat) = booking.seat() {
            flight.seats().release(seat);
        }
        self.unfollow_if_unbooked(passenger, &flight).await;

        let cost = booking.cost();
        let amount_paid = booking.amount_paid();
        let refund = refund_for(amount_paid, flight.departure_date(), today);
        info!(passenger = passenger.name(), %booking_id, amount_paid, refund, "booking cancelled");

        Ok(Cancellation {
            booking_id,
            flight_number: flight.number().to_string(),
            seat: booking.seat(),
            cost,
            amount_paid,
            refund,
        })
    }

    async fn unfollow_if_unbooked(&self, passenger: &Passenger, flight: &Flight) {
        if passenger.has_booking_on(flight.number()) {
            return;
        }
        let in_group = self
            .groups
            .for_passenger(passenger.name())
            .await
            .iter()
            .any(|g| g.flight.number() == flight.number());
        if !in_group {
            passenger.unsubscribe_from(flight);
        }
    }

    /// Open a pending group with one unseated booking per distinct passenger.
    /// The discount is fixed here from the group size.
    pub async fn start_group(
        &self,
        flight: &Arc<Flight>,
        passengers: &[Arc<Passenger>],
        contact: GroupContact,
    ) -> BookingResult<GroupBooking> {
        let distinct: HashSet<&str> = passengers.iter().map(|p| p.name()).collect();
        if distinct.is_empty() {
            return Err(BookingError::Validation(
                "a group booking needs at least one passenger".to_string(),
            ));
        }

        let id = self.groups.next_group_id().await?;
        let discount = discount_for(distinct.len());
        let group = GroupBooking::new(id, Arc::clone(flight), passengers, discount, contact);
        info!(group = %group.id(), flight = flight.number(), passengers = group.passenger_count(), discount, "group booking started");
        Ok(group)
    }

    /// Release a pending group's seats and give its id back to the store.
    pub async fn abandon_group(&self, mut group: GroupBooking) -> BookingResult<usize> {
        let released = group.abandon()?;
        self.groups.release_group_id(group.id()).await;
        Ok(released)
    }

    /// Charge the discounted total once and persist the group.
    ///
    /// Nothing is charged unless every member is seated. A declined payment
    /// discards the group and releases every seat it held.
    pub async fn commit_group(&self, group: GroupBooking) -> Result<GroupId, GroupCommitError> {
        match group.status() {
            GroupStatus::Discarded => {
                self.groups.release_group_id(group.id()).await;
                return Err(GroupCommitError::Rejected(BookingError::GroupDiscarded(
                    group.id().to_string(),
                )));
            }
            GroupStatus::Committed => {
                return Err(GroupCommitError::Rejected(BookingError::Validation(format!(
                    "group {} is already committed",
                    group.id()
                ))))
            }
            GroupStatus::Pending => {}
        }

        if !group.are_all_seats_assigned() {
            let unassigned = group.unassigned().len();
            return Err(GroupCommitError::Incomplete {
                source: BookingError::GroupIncomplete {
                    group: group.id().to_string(),
                    unassigned,
                },
                group: Box::new(group),
            });
        }

        if group.passenger_count() == 0 || self.groups.get(group.id()).await.is_some() {
            let reason = if group.passenger_count() == 0 {
                format!("group {} has no passengers", group.id())
            } else {
                format!("group id {} is already in use", group.id())
            };
            return Err(self.reject(group, BookingError::Validation(reason)).await);
        }

        let total = group.total_cost();
        if let Err(err) = self.payments.charge(total, &group.to_string()).await {
            return Err(self.reject(group, err).await);
        }

        let mut group = group;
        group.mark_committed();
        let id = group.id().clone();
        let flight = Arc::clone(group.flight());
        for passenger in group.passengers() {
            passenger.subscribe_to(&flight);
        }

        if !self.groups.insert(group).await {
            error!(group = %id, "paid group could not be stored");
            return Err(GroupCommitError::Rejected(BookingError::Validation(format!(
                "group id {id} is already in use"
            ))));
        }
        info!(group = %id, flight = flight.number(), total, "group booking committed");
        Ok(id)
    }

    async fn reject(&self, group: GroupBooking, cause: BookingError) -> GroupCommitError {
        let id = group.id().clone();
        if let Err(err) = self.abandon_group(group).await {
            error!(group = %id, error = %err, "could not discard rejected group");
        }
        GroupCommitError::Rejected(cause)
    }

    /// Take one passenger out of a committed group and free their seat.
    pub async fn leave_group(&self, group_id: &GroupId, passenger: &Passenger) -> BookingResult<()> {
        let group = self
            .groups
            .get(group_id)
            .await
            .ok_or_else(|| BookingError::GroupNotFound(group_id.to_string()))?;

        if !self.groups.remove_member(group_id, passenger.name()).await? {
            return Err(BookingError::PassengerNotInGroup {
                group: group_id.to_string(),
                passenger: passenger.name().to_string(),
            });
        }

        self.unfollow_if_unbooked(passenger, &group.flight).await;
        info!(group = %group_id, passenger = passenger.name(), "passenger left group");
        Ok(())
    }
}
