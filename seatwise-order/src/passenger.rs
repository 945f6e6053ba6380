use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use seatwise_catalog::{loyalty_points_for, Flight, NotifyError, Subscriber};
use seatwise_core::{BookingError, BookingResult};
use seatwise_shared::FlightNotice;
use tracing::info;
use uuid::Uuid;

use crate::booking::Booking;
use crate::component::PricedComponent;
use crate::loyalty::LoyaltyTier;

#[derive(Debug, Default)]
struct PassengerState {
    bookings: Vec<Booking>,
    loyalty_points: u64,
    subscriptions: BTreeSet<String>,
    inbox: Vec<FlightNotice>,
}

/// A traveller. Identity is the name: two passengers with the same name
/// are the same passenger for group membership and subscriptions.
#[derive(Debug)]
pub struct Passenger {
    name: String,
    state: Mutex<PassengerState>,
}

impl Passenger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(PassengerState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register for status and offer notices on `flight`.
    pub fn subscribe_to(self: &Arc<Self>, flight: &Flight) -> bool {
        let added = flight.subscribe(self);
        self.state.lock().subscriptions.insert(flight.number().to_string());
        added
    }

    pub fn unsubscribe_from(&self, flight: &Flight) -> bool {
        self.state.lock().subscriptions.remove(flight.number());
        flight.unsubscribe(&self.name)
    }

    /// Flight numbers this passenger follows.
    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().subscriptions.iter().cloned().collect()
    }

    /// Attach a paid booking and accrue its points. Returns the points earned.
    pub fn add_booking(&self, booking: Booking) -> u64 {
        let earned = loyalty_points_for(booking.cost());
        let mut state = self.state.lock();
        state.loyalty_points += earned;
        state.bookings.push(booking);
        earned
    }

    pub fn add_loyalty_points(&self, points: u64) {
        self.state.lock().loyalty_points += points;
    }

    pub fn loyalty_points(&self) -> u64 {
        self.state.lock().loyalty_points
    }

    pub fn loyalty_tier(&self) -> LoyaltyTier {
        LoyaltyTier::for_points(self.loyalty_points())
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.state.lock().bookings.clone()
    }

    pub fn booking(&self, id: Uuid) -> Option<Booking> {
        self.state.lock().bookings.iter().find(|b| b.id == id).cloned()
    }

    /// Detach a booking. Seats and subscriptions are the caller's concern.
    pub fn take_booking(&self, id: Uuid) -> Option<Booking> {
        let mut state = self.state.lock();
        let index = state.bookings.iter().position(|b| b.id == id)?;
        Some(state.bookings.remove(index))
    }

    pub fn has_booking_on(&self, flight_number: &str) -> bool {
        self.state
            .lock()
            .bookings
            .iter()
            .any(|b| b.component().flight_ref() == flight_number)
    }

    /// Swap the component of one of this passenger's bookings.
    pub fn replace_booking_component(
        &self,
        id: Uuid,
        component: PricedComponent,
    ) -> BookingResult<PricedComponent> {
        self.update_booking(id, |booking| booking.replace_component(component))
    }

    /// Run `f` against the live booking while holding the passenger lock,
    /// so read-modify-write sequences see no interleaved update.
    pub fn update_booking<R>(&self, id: Uuid, f: impl FnOnce(&mut Booking) -> R) -> BookingResult<R> {
        let mut state = self.state.lock();
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(BookingError::BookingNotFound(id))?;
        Ok(f(booking))
    }

    /// Notices received so far, oldest first.
    pub fn inbox(&self) -> Vec<FlightNotice> {
        self.state.lock().inbox.clone()
    }
}

impl Subscriber for Passenger {
    fn subscriber_key(&self) -> &str {
        &self.name
    }

    fn notify(&self, notice: &FlightNotice) -> Result<(), NotifyError> {
        info!(passenger = %self.name, flight = %notice.flight_number, "{} received update: {}", self.name, notice.message);
        self.state.lock().inbox.push(notice.clone());
        Ok(())
    }
}

impl PartialEq for Passenger {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Passenger {}

impl Hash for Passenger {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
