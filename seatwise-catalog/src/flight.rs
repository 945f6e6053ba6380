use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use seatwise_core::{BookingError, Money};
use seatwise_shared::{FlightNotice, NoticeKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::seat_grid::SeatGrid;
use crate::subscription::{Delivery, Subscriber, SubscriberList};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    OnTime,
    Delayed,
    Cancelled,
    Boarding,
    Departed,
    Landed,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::OnTime,
        FlightStatus::Delayed,
        FlightStatus::Cancelled,
        FlightStatus::Boarding,
        FlightStatus::Departed,
        FlightStatus::Landed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FlightStatus::OnTime => "On Time",
            FlightStatus::Delayed => "Delayed",
            FlightStatus::Cancelled => "Cancelled",
            FlightStatus::Boarding => "Boarding",
            FlightStatus::Departed => "Departed",
            FlightStatus::Landed => "Landed",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlightStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| c.is_alphanumeric()).collect();
        FlightStatus::ALL
            .into_iter()
            .find(|status| {
                let label: String = status.label().chars().filter(|c| c.is_alphanumeric()).collect();
                label.eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| BookingError::Validation(format!("unknown flight status: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub departure: String,
    pub arrival: String,
}

impl Route {
    pub fn new(departure: impl Into<String>, arrival: impl Into<String>) -> Self {
        Self {
            departure: departure.into(),
            arrival: arrival.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.departure, self.arrival)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpecialOffer {
    pub discount_percentage: f64,
    pub price: Money,
}

#[derive(Debug)]
struct FlightState {
    status: FlightStatus,
    offer: Option<SpecialOffer>,
}

/// A scheduled flight: identity is the flight number.
///
/// Owns its seat grid and a weak subscriber list. Status and price are
/// mutable through `&self` so one `Arc<Flight>` can be shared by bookings,
/// the catalog, and concurrent callers.
pub struct Flight {
    number: String,
    route: Route,
    airline: String,
    departure_date: NaiveDate,
    departure_time: NaiveTime,
    duration_hours: f64,
    base_price: Money,
    state: Mutex<FlightState>,
    seats: SeatGrid,
    subscribers: SubscriberList,
}

impl Flight {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: impl Into<String>,
        route: Route,
        airline: impl Into<String>,
        departure_date: NaiveDate,
        departure_time: NaiveTime,
        duration_hours: f64,
        base_price: Money,
        seats: SeatGrid,
    ) -> Self {
        Self {
            number: number.into(),
            route,
            airline: airline.into(),
            departure_date,
            departure_time,
            duration_hours,
            base_price,
            state: Mutex::new(FlightState {
                status: FlightStatus::OnTime,
                offer: None,
            }),
            seats,
            subscribers: SubscriberList::new(),
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn airline(&self) -> &str {
        &self.airline
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_date
    }

    pub fn departure_time(&self) -> NaiveTime {
        self.departure_time
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    pub fn base_price(&self) -> Money {
        self.base_price
    }

    pub fn seats(&self) -> &SeatGrid {
        &self.seats
    }

    /// Offer price when a special offer is active, otherwise the base fare.
    pub fn current_price(&self) -> Money {
        self.state
            .lock()
            .offer
            .map(|offer| offer.price)
            .unwrap_or(self.base_price)
    }

    pub fn discount_percentage(&self) -> f64 {
        self.state
            .lock()
            .offer
            .map(|offer| offer.discount_percentage)
            .unwrap_or(0.0)
    }

    pub fn special_offer(&self) -> Option<SpecialOffer> {
        self.state.lock().offer
    }

    pub fn status(&self) -> FlightStatus {
        self.state.lock().status
    }

    fn headline(&self) -> String {
        format!(
            "Flight {} ({}) on {}",
            self.number, self.route, self.departure_date
        )
    }

    /// Change status, then notify every subscriber.
    ///
    /// The new status is visible to readers before any subscriber runs and
    /// stays in place whatever the subscribers return.
    pub fn set_status(&self, status: FlightStatus) -> Delivery {
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.status, status)
        };
        info!(flight = %self.number, from = %previous, to = %status, "flight status changed");

        let notice = FlightNotice::new(
            self.number.clone(),
            NoticeKind::StatusChanged { status: status.to_string() },
            format!("{} status updated to: {}", self.headline(), status),
        );
        self.subscribers.broadcast(&notice)
    }

    /// Put the flight on offer at `price`. Status is untouched.
    pub fn set_special_offer(&self, discount_percentage: f64, price: Money) -> Result<Delivery, BookingError> {
        if !(0.0..=100.0).contains(&discount_percentage) || !price.is_finite() || price < 0.0 {
            return Err(BookingError::Validation(format!(
                "invalid special offer: {discount_percentage}% at {price:.2}"
            )));
        }
        self.state.lock().offer = Some(SpecialOffer { discount_percentage, price });
        info!(flight = %self.number, discount_percentage, price, "special offer set");

        let notice = FlightNotice::new(
            self.number.clone(),
            NoticeKind::SpecialOffer { discount_percentage, price },
            format!(
                "{} special offer: {}% off, now ${:.2}",
                self.headline(),
                discount_percentage,
                price
            ),
        );
        Ok(self.subscribers.broadcast(&notice))
    }

    /// Offer at `base_price * (1 - pct/100)`.
    pub fn apply_discount(&self, discount_percentage: f64) -> Result<Delivery, BookingError> {
        let price = self.base_price * (1.0 - discount_percentage / 100.0);
        self.set_special_offer(discount_percentage, price)
    }

    /// Restore the base fare. Returns `None` when no offer was active.
    pub fn remove_special_offer(&self) -> Option<Delivery> {
        self.state.lock().offer.take()?;
        info!(flight = %self.number, "special offer removed");

        let notice = FlightNotice::new(
            self.number.clone(),
            NoticeKind::OfferEnded { price: self.base_price },
            format!(
                "{} special offer has ended, price is back to ${:.2}",
                self.headline(),
                self.base_price
            ),
        );
        Some(self.subscribers.broadcast(&notice))
    }

    pub fn subscribe<S: Subscriber + 'static>(&self, subscriber: &Arc<S>) -> bool {
        self.subscribers.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, key: &str) -> bool {
        self.subscribers.unsubscribe(key)
    }

    pub fn is_subscribed(&self, key: &str) -> bool {
        self.subscribers.contains(key)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Flight {} from {} to {} - Status: {}",
            self.number,
            self.route.departure,
            self.route.arrival,
            self.status()
        )
    }
}

impl fmt::Debug for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flight")
            .field("number", &self.number)
            .field("route", &self.route)
            .field("airline", &self.airline)
            .field("departure_date", &self.departure_date)
            .field("status", &self.status())
            .field("price", &self.current_price())
            .field("seats", &self.seats)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}
