use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use seatwise_catalog::{Delivery, Flight, FlightCatalog, FlightStatus, Route, SeatGrid};
use seatwise_core::{BookingError, BookingResult};
use tracing::info;

use crate::app_config::{Config, FlightSeed, SeatMapConfig};

/// Flight schedule held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryFlightCatalog {
    flights: RwLock<Vec<Arc<Flight>>>,
}

impl InMemoryFlightCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// One flight per configured seed, each with its own seat grid.
    ///
    /// With `occupancy_seed` set every grid is seeded from it plus the
    /// flight's position, so runs are reproducible and flights differ.
    pub fn from_config(config: &Config) -> BookingResult<Self> {
        let catalog = Self::new();
        for (index, seed) in config.flights.iter().enumerate() {
            let grid_seed = config
                .seat_map
                .occupancy_seed
                .map(|s| s.wrapping_add(index as u64));
            catalog.insert(build_flight(seed, &config.seat_map, grid_seed)?)?;
        }
        info!(flights = catalog.len(), "flight catalog loaded");
        Ok(catalog)
    }

    /// Fails if a flight with the same number (ignoring case) exists.
    pub fn insert(&self, flight: Flight) -> BookingResult<Arc<Flight>> {
        let mut flights = self.flights.write();
        if flights
            .iter()
            .any(|f| f.number().eq_ignore_ascii_case(flight.number()))
        {
            return Err(BookingError::Validation(format!(
                "flight {} already scheduled",
                flight.number()
            )));
        }
        let flight = Arc::new(flight);
        flights.push(Arc::clone(&flight));
        Ok(flight)
    }

    pub fn len(&self) -> usize {
        self.flights.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set a flight's status and notify its subscribers.
    pub fn update_status(&self, number: &str, status: FlightStatus) -> BookingResult<Delivery> {
        let flight = self
            .flight(number)
            .ok_or_else(|| BookingError::FlightNotFound(number.to_string()))?;
        Ok(flight.set_status(status))
    }

    pub fn departures(&self) -> Vec<String> {
        self.distinct(|f| Some(f.route().departure.clone()))
    }

    pub fn arrivals(&self) -> Vec<String> {
        self.distinct(|f| Some(f.route().arrival.clone()))
    }

    /// Destinations reachable from `departure`.
    pub fn arrivals_from(&self, departure: &str) -> Vec<String> {
        self.distinct(|f| {
            f.route()
                .departure
                .eq_ignore_ascii_case(departure)
                .then(|| f.route().arrival.clone())
        })
    }

    pub fn airlines(&self) -> Vec<String> {
        self.distinct(|f| Some(f.airline().to_string()))
    }

    fn distinct(&self, pick: impl Fn(&Flight) -> Option<String>) -> Vec<String> {
        self.flights
            .read()
            .iter()
            .filter_map(|f| pick(f.as_ref()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl FlightCatalog for InMemoryFlightCatalog {
    fn flight(&self, number: &str) -> Option<Arc<Flight>> {
        self.flights
            .read()
            .iter()
            .find(|f| f.number().eq_ignore_ascii_case(number))
            .cloned()
    }

    fn flights(&self) -> Vec<Arc<Flight>> {
        self.flights.read().clone()
    }
}

fn build_flight(seed: &FlightSeed, seat_map: &SeatMapConfig, grid_seed: Option<u64>) -> BookingResult<Flight> {
    let seats = SeatGrid::with_occupancy(
        seat_map.rows,
        seat_map.columns,
        seat_map.initial_occupancy,
        grid_seed,
    )?;
    Ok(Flight::new(
        seed.number.clone(),
        Route::new(seed.departure.clone(), seed.arrival.clone()),
        seed.airline.clone(),
        seed.date,
        seed.time,
        seed.duration_hours,
        seed.price,
        seats,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use seatwise_catalog::FlightQuery;

    const SCHEDULE: &str = r#"
        [seat_map]
        rows = 10
        columns = 6
        initial_occupancy = 0.5
        occupancy_seed = 11

        [[flights]]
        number = "SW100"
        departure = "JFK"
        arrival = "LHR"
        airline = "Seatwise Air"
        date = "2025-06-01"
        time = "09:30:00"
        duration_hours = 7.0
        price = 300.0

        [[flights]]
        number = "SW101"
        departure = "JFK"
        arrival = "CDG"
        airline = "Aisle Airways"
        date = "2025-06-03"
        time = "18:00:00"
        duration_hours = 7.5
        price = 420.0

        [[flights]]
        number = "SW200"
        departure = "BOS"
        arrival = "LHR"
        airline = "Seatwise Air"
        date = "2025-06-10"
        time = "21:15:00"
        duration_hours = 6.5
        price = 280.0
    "#;

    fn seeded_catalog() -> InMemoryFlightCatalog {
        InMemoryFlightCatalog::from_config(&Config::from_toml(SCHEDULE).unwrap()).unwrap()
    }

    #[test]
    fn test_loads_schedule_with_seeded_grids() {
        let catalog = seeded_catalog();
        assert_eq!(catalog.len(), 3);

        let flight = catalog.flight("sw100").unwrap();
        assert_eq!(flight.seats().capacity(), 60);
        assert_eq!(flight.seats().occupied_count(), 30);

        let again = seeded_catalog();
        assert_eq!(
            again.flight("SW100").unwrap().seats().occupied(),
            flight.seats().occupied()
        );
    }

    #[test]
    fn test_rejects_duplicate_numbers() {
        let catalog = seeded_catalog();
        let config = Config::from_toml(SCHEDULE).unwrap();
        let duplicate = build_flight(&config.flights[0], &config.seat_map, None).unwrap();
        assert!(matches!(catalog.insert(duplicate), Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_listings_and_queries() {
        let catalog = seeded_catalog();
        assert_eq!(catalog.departures(), vec!["BOS", "JFK"]);
        assert_eq!(catalog.arrivals(), vec!["CDG", "LHR"]);
        assert_eq!(catalog.arrivals_from("jfk"), vec!["CDG", "LHR"]);
        assert_eq!(catalog.airlines(), vec!["Aisle Airways", "Seatwise Air"]);

        assert_eq!(catalog.search("jfk", "lhr").len(), 1);
        let cheap = catalog.query(&FlightQuery::new().max_price(300.0));
        assert_eq!(cheap.len(), 2);
        let june_first_week = catalog.query(&FlightQuery::new().between(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(),
        ));
        assert_eq!(june_first_week.len(), 2);
    }

    #[test]
    fn test_update_status() {
        let catalog = seeded_catalog();
        catalog.update_status("SW101", FlightStatus::Boarding).unwrap();
        assert_eq!(catalog.flight("SW101").unwrap().status(), FlightStatus::Boarding);
        assert!(matches!(
            catalog.update_status("XX1", FlightStatus::Landed),
            Err(BookingError::FlightNotFound(_))
        ));
    }

    #[test]
    fn test_bad_grid_dimensions_surface() {
        let config = Config::from_toml(&SCHEDULE.replace("columns = 6", "columns = 0")).unwrap();
        assert!(matches!(
            InMemoryFlightCatalog::from_config(&config),
            Err(BookingError::InvalidSeatCode(_))
        ));
    }
}
