//! Display time zone selection
//!
//! Billing always computes in UTC; the zone chosen here only affects how
//! interval boundaries are rendered.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Result, VmchargeError};

/// Zone used when rendering instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayZone {
    tz: Tz,
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self {
            tz: detect_local_timezone(),
        }
    }
}

impl DisplayZone {
    /// UTC display
    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    /// Resolve the zone from CLI arguments; `use_utc` wins over `name`
    pub fn from_cli(name: Option<&str>, use_utc: bool) -> Result<Self> {
        if use_utc {
            return Ok(Self::utc());
        }

        match name {
            Some(name) => Tz::from_str(name).map(|tz| Self { tz }).map_err(|_| {
                VmchargeError::InvalidTimezone(format!(
                    "'{name}'. Use format like 'Europe/London', 'America/Toronto', or 'UTC'"
                ))
            }),
            None => Ok(Self::default()),
        }
    }

    /// Underlying zone
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Zone name for headers
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Render an instant as `YYYY-MM-DD HH:MM:SS ZONE`
    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string()
    }
}

/// Detect the local zone: `TZ` first, then the system setting, then UTC
pub fn detect_local_timezone() -> Tz {
    if let Ok(name) = std::env::var("TZ")
        && let Ok(tz) = Tz::from_str(&name)
    {
        debug!("Using timezone from TZ environment variable: {}", name);
        return tz;
    }

    match iana_time_zone::get_timezone() {
        Ok(name) => Tz::from_str(&name).unwrap_or_else(|_| {
            debug!("Unrecognized system timezone '{}', falling back to UTC", name);
            Tz::UTC
        }),
        Err(e) => {
            debug!("Could not detect local timezone: {:?}, falling back to UTC", e);
            Tz::UTC
        }
    }
}
