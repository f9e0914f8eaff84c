//! Engine configuration.
//!
//! Loaded from TOML with per-field defaults, then optionally overridden from
//! the environment:
//!
//! - `SLOTBOOK_BASE_URL`: root of the bookings/availability API
//! - `SLOTBOOK_TIMEZONE`: IANA zone passed to the backend
//! - `SLOTBOOK_API_TOKEN`: bearer token sent on every request

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use slot_engine::{parse_time_of_day, validate_timezone, Interval, TimeOfDay};

use crate::error::{BookingError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub base_url: String,
    pub slot_minutes: u16,
    pub business_hours_start: String,
    pub business_hours_end: String,
    pub timezone: String,
    pub request_timeout_secs: u64,
    pub booking_type: String,
    pub api_token: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            slot_minutes: slot_engine::DEFAULT_GRANULARITY,
            business_hours_start: "09:00".to_string(),
            business_hours_end: "18:00".to_string(),
            timezone: "UTC".to_string(),
            request_timeout_secs: 30,
            booking_type: "consultation".to_string(),
            api_token: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| BookingError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BookingError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Override fields from `SLOTBOOK_*` environment variables.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("SLOTBOOK_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(tz) = std::env::var("SLOTBOOK_TIMEZONE") {
            self.timezone = tz;
        }
        if let Ok(token) = std::env::var("SLOTBOOK_API_TOKEN") {
            self.api_token = Some(token);
        }
        self
    }

    /// # Errors
    /// `BookingError::Config` for a zero granularity or an empty or inverted
    /// business-hours window; `BookingError::Format` for unparseable hours or
    /// an unknown timezone.
    pub fn validate(&self) -> Result<()> {
        if self.slot_minutes == 0 {
            return Err(BookingError::Config("slot_minutes must be positive".into()));
        }
        let (start, end) = self.business_hours()?;
        if end <= start {
            return Err(BookingError::Config(format!(
                "business hours {} to {} are empty",
                self.business_hours_start, self.business_hours_end
            )));
        }
        validate_timezone(&self.timezone)?;
        Ok(())
    }

    /// Parsed business-hours pair. An end of `00:00` means end of day.
    pub fn business_hours(&self) -> Result<(TimeOfDay, TimeOfDay)> {
        let hours = Interval::new(
            parse_time_of_day(&self.business_hours_start)?,
            parse_time_of_day(&self.business_hours_end)?,
        )
        .with_midnight_rollover();
        Ok((hours.start, hours.end))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
