pub mod models;
pub mod pii;

pub use models::events::{FlightNotice, NoticeKind};
pub use pii::Masked;
