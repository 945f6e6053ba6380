pub mod flight;
pub mod pricing;
pub mod search;
pub mod seat_grid;
pub mod subscription;

pub use flight::{Flight, FlightStatus, Route, SpecialOffer};
pub use pricing::{discount_for, discounted, loyalty_points_for};
pub use search::{FlightCatalog, FlightQuery};
pub use seat_grid::{SeatCode, SeatError, SeatGrid, MAX_COLUMNS, MAX_ROWS};
pub use subscription::{Delivery, NotifyError, Subscriber, SubscriberList};
