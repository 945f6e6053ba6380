pub mod app_config;
pub mod flight_repo;
pub mod group_repo;

pub use app_config::Config;
pub use flight_repo::InMemoryFlightCatalog;
pub use group_repo::InMemoryGroupBookingStore;
