use std::fmt;
use std::sync::Arc;

use seatwise_catalog::{Flight, SeatCode};
use seatwise_core::{BookingError, Money};
use serde::{Deserialize, Serialize};

/// Add-on services that can be layered over a reservation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Service {
    Insurance,
    Meal,
    PriorityBoarding,
}

impl Service {
    /// Flat surcharge added on top of whatever it wraps.
    pub fn surcharge(&self) -> Money {
        match self {
            Service::Insurance => 50.0,
            Service::Meal => 20.0,
            Service::PriorityBoarding => 30.0,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Service::Insurance => ", with Insurance",
            Service::Meal => ", with Meal",
            Service::PriorityBoarding => ", with Priority Boarding",
        }
    }
}

impl std::str::FromStr for Service {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "insurance" => Ok(Service::Insurance),
            "meal" => Ok(Service::Meal),
            "priorityboarding" | "priority" => Ok(Service::PriorityBoarding),
            other => Err(BookingError::Validation(format!("unknown service: {other}"))),
        }
    }
}

/// The innermost layer: one passenger on one flight, optionally seated.
#[derive(Clone)]
pub struct BaseReservation {
    pub flight: Arc<Flight>,
    pub passenger_name: String,
    pub seat: Option<SeatCode>,
}

impl BaseReservation {
    pub fn new(flight: Arc<Flight>, passenger_name: impl Into<String>, seat: Option<SeatCode>) -> Self {
        Self {
            flight,
            passenger_name: passenger_name.into(),
            seat,
        }
    }

    fn description(&self) -> String {
        let seat = self
            .seat
            .map(|seat| seat.to_string())
            .unwrap_or_else(|| "unassigned".to_string());
        let route = self.flight.route();
        format!(
            "Flight {} ({}->{}) booking for {} (Seat: {})",
            self.flight.number(),
            route.departure,
            route.arrival,
            self.passenger_name,
            seat
        )
    }
}

impl fmt::Debug for BaseReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseReservation")
            .field("flight", &self.flight.number())
            .field("passenger_name", &self.passenger_name)
            .field("seat", &self.seat.map(|s| s.to_string()))
            .finish()
    }
}

/// A base reservation wrapped by zero or more services.
///
/// Each `Service` layer owns exactly one inner component, so the chain is a
/// singly linked list ending in a `Reservation`. Chains are only ever grown
/// by wrapping an existing value.
#[derive(Debug, Clone)]
pub enum PricedComponent {
    Reservation(BaseReservation),
    Service {
        service: Service,
        inner: Box<PricedComponent>,
    },
}

impl PricedComponent {
    pub fn reservation(flight: Arc<Flight>, passenger_name: impl Into<String>, seat: Option<SeatCode>) -> Self {
        PricedComponent::Reservation(BaseReservation::new(flight, passenger_name, seat))
    }

    pub fn wrap(self, service: Service) -> Self {
        PricedComponent::Service {
            service,
            inner: Box::new(self),
        }
    }

    /// Wrap with each service in order.
    pub fn wrap_all(self, services: &[Service]) -> Self {
        services.iter().fold(self, |component, service| component.wrap(*service))
    }

    /// The reservation at the bottom of the chain.
    pub fn base(&self) -> &BaseReservation {
        let mut current = self;
        loop {
            match current {
                PricedComponent::Reservation(base) => return base,
                PricedComponent::Service { inner, .. } => current = inner.as_ref(),
            }
        }
    }

    /// Services in the order they were applied, innermost first.
    pub fn services(&self) -> Vec<Service> {
        let mut services = Vec::new();
        let mut current = self;
        while let PricedComponent::Service { service, inner } = current {
            services.push(*service);
            current = inner.as_ref();
        }
        services.reverse();
        services
    }

    /// Current fare plus every surcharge.
    pub fn cost(&self) -> Money {
        let surcharges: Money = self.services().iter().map(Service::surcharge).sum();
        self.base().flight.current_price() + surcharges
    }

    pub fn description(&self) -> String {
        self.services()
            .iter()
            .fold(self.base().description(), |mut description, service| {
                description.push_str(service.suffix());
                description
            })
    }

    pub fn flight(&self) -> &Arc<Flight> {
        &self.base().flight
    }

    pub fn flight_ref(&self) -> &str {
        self.base().flight.number()
    }

    pub fn seat(&self) -> Option<SeatCode> {
        self.base().seat
    }

    pub fn passenger_name(&self) -> &str {
        &self.base().passenger_name
    }

    /// Same passenger, flight and services over a different seat.
    pub fn with_seat(&self, seat: Option<SeatCode>) -> Self {
        let base = self.base();
        PricedComponent::reservation(Arc::clone(&base.flight), base.passenger_name.clone(), seat)
            .wrap_all(&self.services())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;
    use seatwise_catalog::{Route, SeatGrid};

    fn flight(price: Money) -> Arc<Flight> {
        Arc::new(Flight::new(
            "SW200",
            Route::new("BOS", "SFO"),
            "Seatwise Air",
            NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            6.5,
            price,
            SeatGrid::new(30, 7).unwrap(),
        ))
    }

    fn base(price: Money) -> PricedComponent {
        let flight = flight(price);
        let seat = flight.seats().parse_seat_code("12B").unwrap();
        PricedComponent::reservation(flight, "Ada", Some(seat))
    }

    #[test]
    fn test_base_description() {
        assert_eq!(
            base(300.0).description(),
            "Flight SW200 (BOS->SFO) booking for Ada (Seat: 12B)"
        );
        let unseated = PricedComponent::reservation(flight(300.0), "Ada", None);
        assert!(unseated.description().ends_with("(Seat: unassigned)"));
    }

    #[test]
    fn test_insurance_then_priority() {
        let component = base(300.0)
            .wrap(Service::Insurance)
            .wrap(Service::PriorityBoarding);

        assert_eq!(component.cost(), 380.0);
        assert!(component
            .description()
            .ends_with(", with Insurance, with Priority Boarding"));
        assert_eq!(component.flight_ref(), "SW200");
    }

    #[test]
    fn test_description_follows_application_order() {
        let forward = base(100.0).wrap(Service::Insurance).wrap(Service::Meal);
        let backward = base(100.0).wrap(Service::Meal).wrap(Service::Insurance);

        assert!(forward.description().ends_with(", with Insurance, with Meal"));
        assert!(backward.description().ends_with(", with Meal, with Insurance"));
        assert_eq!(forward.cost(), backward.cost());
    }

    #[test]
    fn test_cost_tracks_current_price() {
        let component = base(300.0).wrap(Service::Meal);
        component.flight().apply_discount(50.0).unwrap();
        assert_eq!(component.cost(), 170.0);
    }

    #[test]
    fn test_with_seat_preserves_services() {
        let component = base(300.0).wrap(Service::Meal).wrap(Service::Insurance);
        let moved = component.with_seat(Some(component.flight().seats().parse_seat_code("3E").unwrap()));

        assert_eq!(moved.services(), vec![Service::Meal, Service::Insurance]);
        assert_eq!(moved.seat().unwrap().to_string(), "3E");
        assert_eq!(moved.cost(), component.cost());
        assert!(moved.description().contains("(Seat: 3E), with Meal, with Insurance"));
    }

    #[test]
    fn test_service_parsing() {
        assert_eq!("priority boarding".parse::<Service>().unwrap(), Service::PriorityBoarding);
        assert_eq!("MEAL".parse::<Service>().unwrap(), Service::Meal);
        assert!("lounge".parse::<Service>().is_err());
    }

    fn service_strategy() -> impl Strategy<Value = Service> {
        prop_oneof![
            Just(Service::Insurance),
            Just(Service::Meal),
            Just(Service::PriorityBoarding),
        ]
    }

    proptest! {
        #[test]
        fn prop_cost_is_sum_of_surcharges(services in proptest::collection::vec(service_strategy(), 0..6)) {
            let component = base(200.0).wrap_all(&services);
            let expected = 200.0 + services.iter().map(Service::surcharge).sum::<f64>();
            prop_assert!((component.cost() - expected).abs() < 1e-9);

            let mut reversed = services.clone();
            reversed.reverse();
            let other = base(200.0).wrap_all(&reversed);
            prop_assert!((component.cost() - other.cost()).abs() < 1e-9);
            prop_assert_eq!(component.services(), services);
        }
    }
}
