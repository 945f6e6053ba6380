pub mod payment;

use uuid::Uuid;

pub use payment::{PaymentGateway, PaymentReceipt, PaymentRequest, PaymentStatus};

/// Monetary amounts are carried as plain floating point fares.
pub type Money = f64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Seat {seat} on flight {flight} is not available")]
    SeatUnavailable { flight: String, seat: String },
    #[error("Invalid seat code: {0}")]
    InvalidSeatCode(String),
    #[error("Passenger {passenger} is not part of group {group}")]
    PassengerNotInGroup { group: String, passenger: String },
    #[error("Payment of {amount:.2} declined: {reason}")]
    PaymentDeclined { amount: Money, reason: String },
    #[error("Group {group} still has {unassigned} passenger(s) without a seat")]
    GroupIncomplete { group: String, unassigned: usize },
    #[error("Flight not found: {0}")]
    FlightNotFound(String),
    #[error("Flight {0} has no free seats")]
    FlightFull(String),
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),
    #[error("Group booking not found: {0}")]
    GroupNotFound(String),
    #[error("Group booking {0} was discarded")]
    GroupDiscarded(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl BookingError {
    /// Errors the caller can recover from by picking another seat.
    pub fn is_seat_conflict(&self) -> bool {
        matches!(self, BookingError::SeatUnavailable { .. } | BookingError::FlightFull(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
