use std::sync::Arc;

use chrono::NaiveDate;
use seatwise_core::Money;
use serde::{Deserialize, Serialize};

use crate::flight::Flight;

/// Read access to scheduled flights.
///
/// Bookings that were reloaded from records find their flight through this
/// trait; the engine never builds a catalog on its own.
pub trait FlightCatalog: Send + Sync {
    /// Case-insensitive lookup by flight number.
    fn flight(&self, number: &str) -> Option<Arc<Flight>>;

    /// All flights in schedule order.
    fn flights(&self) -> Vec<Arc<Flight>>;

    /// Flights on a route, compared case-insensitively.
    fn search(&self, departure: &str, arrival: &str) -> Vec<Arc<Flight>> {
        self.query(&FlightQuery::new().departure(departure).arrival(arrival))
    }

    fn query(&self, query: &FlightQuery) -> Vec<Arc<Flight>> {
        self.flights()
            .into_iter()
            .filter(|flight| query.matches(flight))
            .collect()
    }
}

/// Conjunctive filter over flights. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlightQuery {
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub airline: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub max_price: Option<Money>,
    pub max_duration_hours: Option<f64>,
}

impl FlightQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn departure(mut self, departure: impl Into<String>) -> Self {
        self.departure = Some(departure.into());
        self
    }

    pub fn arrival(mut self, arrival: impl Into<String>) -> Self {
        self.arrival = Some(arrival.into());
        self
    }

    pub fn airline(mut self, airline: impl Into<String>) -> Self {
        self.airline = Some(airline.into());
        self
    }

    /// Inclusive on both ends.
    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from_date = Some(from);
        self.to_date = Some(to);
        self
    }

    /// Compared against the current price, so active offers count.
    pub fn max_price(mut self, max_price: Money) -> Self {
        self.max_price = Some(max_price);
        self
    }

    pub fn max_duration(mut self, hours: f64) -> Self {
        self.max_duration_hours = Some(hours);
        self
    }

    pub fn matches(&self, flight: &Flight) -> bool {
        let text_matches = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .map_or(true, |wanted| wanted.eq_ignore_ascii_case(actual))
        };
        let date = flight.departure_date();

        text_matches(&self.departure, &flight.route().departure)
            && text_matches(&self.arrival, &flight.route().arrival)
            && text_matches(&self.airline, flight.airline())
            && self.from_date.map_or(true, |from| date >= from)
            && self.to_date.map_or(true, |to| date <= to)
            && self.max_price.map_or(true, |max| flight.current_price() <= max)
            && self
                .max_duration_hours
                .map_or(true, |max| flight.duration_hours() <= max)
    }
}
