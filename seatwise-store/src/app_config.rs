use chrono::{NaiveDate, NaiveTime};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub seat_map: SeatMapConfig,
    pub payment: PaymentConfig,
    pub logging: LoggingConfig,
    pub flights: Vec<FlightSeed>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SeatMapConfig {
    pub rows: u32,
    pub columns: u32,
    /// Fraction of each grid occupied before any booking, 0.0 to 1.0.
    pub initial_occupancy: f64,
    pub occupancy_seed: Option<u64>,
}

impl Default for SeatMapConfig {
    fn default() -> Self {
        Self {
            rows: 30,
            columns: 7,
            initial_occupancy: 0.3,
            occupancy_seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PaymentConfig {
    pub currency: String,
    pub approval_rate: f64,
    pub seed: Option<u64>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            approval_rate: 0.9,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// One scheduled flight.
#[derive(Debug, Deserialize, Clone)]
pub struct FlightSeed {
    pub number: String,
    pub departure: String,
    pub arrival: String,
    pub airline: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_hours: f64,
    pub price: f64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(File::with_name("config/local").required(false))
            // e.g. SEATWISE__SEAT_MAP__ROWS=40
            .add_source(
                Environment::with_prefix("SEATWISE")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    /// Build from an inline TOML document. Missing keys take their defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::build(config::Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.seat_map.initial_occupancy) {
            return Err(ConfigError::Message(format!(
                "seat_map.initial_occupancy must be between 0 and 1, got {}",
                self.seat_map.initial_occupancy
            )));
        }
        if !(0.0..=1.0).contains(&self.payment.approval_rate) {
            return Err(ConfigError::Message(format!(
                "payment.approval_rate must be between 0 and 1, got {}",
                self.payment.approval_rate
            )));
        }
        if let Some(flight) = self.flights.iter().find(|f| f.price < 0.0) {
            return Err(ConfigError::Message(format!(
                "flight {} has a negative price",
                flight.number
            )));
        }
        Ok(())
    }
}
