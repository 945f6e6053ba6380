pub mod booking;
pub mod cancellation;
pub mod component;
pub mod group;
pub mod loyalty;
pub mod manager;
pub mod orchestrator;
pub mod passenger;
pub mod store;

pub use booking::{Booking, BookingRecord};
pub use cancellation::refund_for;
pub use component::{BaseReservation, PricedComponent, Service};
pub use group::{GroupBooking, GroupContact, GroupId, GroupSnapshot, GroupStatus};
pub use loyalty::LoyaltyTier;
pub use manager::{
    BookingConfirmation, BookingService, Cancellation, Customization, GroupCommitError, SeatChoice,
};
pub use orchestrator::{PaymentOrchestrator, ScriptedOutcome, ScriptedPaymentGateway, SimulatedPaymentGateway};
pub use passenger::Passenger;
pub use store::GroupBookingStore;
