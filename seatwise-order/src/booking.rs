use std::sync::Arc;

use chrono::{DateTime, Utc};
use seatwise_catalog::{Flight, FlightCatalog, SeatCode};
use seatwise_core::{BookingError, BookingResult, Money};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::{PricedComponent, Service};

/// One passenger's reservation on one flight.
///
/// The component chain is only ever replaced as a whole; the booking id is
/// the stable handle across replacements.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: Uuid,
    component: PricedComponent,
    amount_paid: Money,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(component: PricedComponent) -> Self {
        Self {
            id: Uuid::new_v4(),
            component,
            amount_paid: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Sum of every approved charge against this booking. Unlike `cost`,
    /// it does not follow later fare changes.
    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    pub fn record_payment(&mut self, amount: Money) {
        self.amount_paid += amount;
    }

    pub fn component(&self) -> &PricedComponent {
        &self.component
    }

    /// Swap the whole chain and hand back the previous one.
    ///
    /// Callers must keep the same flight and seat identity; nothing here
    /// checks it.
    pub fn replace_component(&mut self, component: PricedComponent) -> PricedComponent {
        std::mem::replace(&mut self.component, component)
    }

    pub fn cost(&self) -> Money {
        self.component.cost()
    }

    pub fn description(&self) -> String {
        self.component.description()
    }

    pub fn flight(&self) -> &Arc<Flight> {
        self.component.flight()
    }

    pub fn seat(&self) -> Option<SeatCode> {
        self.component.seat()
    }

    pub fn passenger_name(&self) -> &str {
        self.component.passenger_name()
    }

    pub fn services(&self) -> Vec<Service> {
        self.component.services()
    }

    pub fn record(&self) -> BookingRecord {
        BookingRecord {
            booking_id: self.id,
            flight_number: self.component.flight_ref().to_string(),
            passenger_name: self.passenger_name().to_string(),
            seat: self.seat(),
            services: self.services(),
            cost: self.cost(),
            amount_paid: self.amount_paid,
            description: self.description(),
            created_at: self.created_at,
        }
    }
}

/// Serializable snapshot of a booking.
///
/// `cost` and `description` are informational; a restored booking prices
/// itself from the live flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRecord {
    pub booking_id: Uuid,
    pub flight_number: String,
    pub passenger_name: String,
    pub seat: Option<SeatCode>,
    pub services: Vec<Service>,
    pub cost: Money,
    #[serde(default)]
    pub amount_paid: Money,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Rebuild the booking, resolving the flight through `catalog`.
    ///
    /// Seat occupancy is left alone: the grid is the source of truth for
    /// which seats are held.
    pub fn restore(&self, catalog: &dyn FlightCatalog) -> BookingResult<Booking> {
        let flight = catalog
            .flight(&self.flight_number)
            .ok_or_else(|| BookingError::FlightNotFound(self.flight_number.clone()))?;

        let component = PricedComponent::reservation(flight, self.passenger_name.clone(), self.seat)
            .wrap_all(&self.services);
        Ok(Booking {
            id: self.booking_id,
            component,
            amount_paid: self.amount_paid,
            created_at: self.created_at,
        })
    }
}
