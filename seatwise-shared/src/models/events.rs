use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a flight broadcast is about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeKind {
    StatusChanged { status: String },
    SpecialOffer { discount_percentage: f64, price: f64 },
    OfferEnded { price: f64 },
}

/// A single message fanned out to every subscriber of a flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightNotice {
    pub id: Uuid,
    pub flight_number: String,
    pub kind: NoticeKind,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

impl FlightNotice {
    pub fn new(flight_number: impl Into<String>, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_number: flight_number.into(),
            kind,
            message: message.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn is_status_change(&self) -> bool {
        matches!(self.kind, NoticeKind::StatusChanged { .. })
    }
}
