//! Clock source: current time in a configured zone.
//!
//! A zone is either an IANA identifier (`Europe/Paris`) or the sentinel
//! `local`. Resolution never fails the caller: an unknown identifier falls
//! back to system-local time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;

/// Sentinel zone name for system-local time.
pub const LOCAL_ZONE: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Named(Tz),
}

impl FromStr for Zone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        if id.eq_ignore_ascii_case(LOCAL_ZONE) {
            return Ok(Zone::Local);
        }
        id.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| CoreError::UnknownZone(id.to_string()))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => f.write_str(LOCAL_ZONE),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl Zone {
    /// Resolve `id`, falling back to local time when it is unknown.
    pub fn resolve(id: &str) -> Zone {
        match id.parse() {
            Ok(zone) => zone,
            Err(e) => {
                tracing::debug!(zone = id, error = %e, "falling back to local time");
                Zone::Local
            }
        }
    }

    /// The instant `utc` as wall time in this zone.
    pub fn at(&self, utc: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => utc.with_timezone(&Local).fixed_offset(),
            Zone::Named(tz) => utc.with_timezone(tz).fixed_offset(),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.at(Utc::now())
    }
}

/// Today's calendar date in system-local time; drives the daily reset.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
