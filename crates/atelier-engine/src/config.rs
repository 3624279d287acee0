//! Shop policy configuration.

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Tunable booking rules. Every field has a default matching the shop's
/// standing policy, so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Non-cancelled trial reservations allowed per (item, date, shift).
    pub shift_capacity: usize,
    /// Days protected on each side of an order's event date.
    pub order_buffer_days: i64,
    /// Days a return date must precede the next event.
    pub return_buffer_days: i64,
    /// Default horizon for the trial-reservation view.
    pub reservation_horizon_days: u32,
    /// Default horizon for the order view.
    pub order_horizon_days: u32,
    /// IANA timezone used to decide what "today" is.
    pub timezone: String,
    /// Dialing prefix added to customer phone numbers.
    pub country_code: String,
    pub messaging_base_url: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            shift_capacity: 2,
            order_buffer_days: 2,
            return_buffer_days: 3,
            reservation_horizon_days: 10,
            order_horizon_days: 180,
            timezone: "America/Sao_Paulo".to_string(),
            country_code: "55".to_string(),
            messaging_base_url: "https://wa.me".to_string(),
        }
    }
}

impl PolicyConfig {
    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `BookingError::Io` if the file cannot be read,
    /// `BookingError::Json` if it is not valid JSON, and
    /// `BookingError::InvalidConfig` if a value is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: PolicyConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.shift_capacity == 0 {
            return Err(BookingError::InvalidConfig(
                "shift_capacity must be at least 1".to_string(),
            ));
        }
        if self.order_buffer_days < 0 || self.return_buffer_days < 0 {
            return Err(BookingError::InvalidConfig(
                "buffer days must not be negative".to_string(),
            ));
        }
        if self.reservation_horizon_days == 0 || self.order_horizon_days == 0 {
            return Err(BookingError::InvalidConfig(
                "horizons must be at least 1 day".to_string(),
            ));
        }
        if !self.country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(BookingError::InvalidConfig(format!(
                "country_code must be digits only: '{}'",
                self.country_code
            )));
        }
        self.tz()?;
        Ok(())
    }

    /// The configured timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| BookingError::InvalidConfig(format!("unknown timezone: {}", self.timezone)))
    }
}
