use std::sync::Arc;

use seatwise_core::payment::PaymentGateway;
use seatwise_core::BookingResult;
use seatwise_order::{BookingService, PaymentOrchestrator, SimulatedPaymentGateway};
use seatwise_store::{Config, InMemoryFlightCatalog, InMemoryGroupBookingStore};

/// Everything the engine needs, built once at startup and passed down.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<InMemoryFlightCatalog>,
    pub groups: Arc<InMemoryGroupBookingStore>,
    pub bookings: Arc<BookingService>,
}

impl AppState {
    /// Wire the simulated gateway described by `payment` in the config.
    pub fn from_config(config: Config) -> BookingResult<Self> {
        let gateway = Arc::new(SimulatedPaymentGateway::new(
            config.payment.approval_rate,
            config.payment.seed,
        ));
        Self::with_gateway(config, gateway)
    }

    pub fn with_gateway(config: Config, gateway: Arc<dyn PaymentGateway>) -> BookingResult<Self> {
        let catalog = Arc::new(InMemoryFlightCatalog::from_config(&config)?);
        let groups = Arc::new(match config.payment.seed {
            Some(seed) => InMemoryGroupBookingStore::seeded(seed),
            None => InMemoryGroupBookingStore::new(),
        });
        let payments = Arc::new(PaymentOrchestrator::new(gateway, config.payment.currency.clone()));
        let bookings = Arc::new(BookingService::new(payments, groups.clone()));

        Ok(Self {
            config: Arc::new(config),
            catalog,
            groups,
            bookings,
        })
    }
}
