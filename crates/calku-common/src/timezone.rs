//! Time zone resolution shared by the value parser and the Expression
//! facade. Grounded on `formualizer_eval::timezone`'s
//! `ClockProvider`/`FixedClock` split, extended with IANA name resolution
//! (via `chrono-tz`) since resolving zone names like `Pacific/Honolulu`
//! needs IANA data a fixed-offset-only `TimeZoneSpec` has no counterpart for.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::CalkuError;

/// Injectable clock, so date lexeme resolution and the Expression facade stay
/// deterministic under test (mirrors `formualizer_eval::timezone::ClockProvider`).
pub trait ClockProvider: fmt::Debug + Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Default clock: reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockProvider for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: always returns the configured instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl ClockProvider for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A time zone resolved to its canonical name and UTC offset "at the current
/// instant".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTimeZone {
    pub name: String,
    pub offset: FixedOffset,
}

impl ResolvedTimeZone {
    /// The default time zone: GMT/UTC.
    pub fn utc() -> Self {
        Self {
            name: "UTC".to_string(),
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    /// Resolve an IANA zone name (e.g. `Pacific/Honolulu`) to its offset at
    /// the clock's current instant. `"UTC"`/`"GMT"` are accepted directly.
    pub fn resolve(name: &str, clock: &dyn ClockProvider) -> Result<Self, CalkuError> {
        if name.eq_ignore_ascii_case("utc") || name.eq_ignore_ascii_case("gmt") {
            return Ok(Self::utc());
        }
        let tz = chrono_tz::Tz::from_str(name)
            .map_err(|_| CalkuError::syntax(format!("unknown time zone '{name}'")))?;
        let now = clock.now_utc().with_timezone(&tz);
        Ok(Self {
            name: tz.name().to_string(),
            offset: now.offset().fix(),
        })
    }
}

impl Default for ResolvedTimeZone {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_utc() {
        let tz = ResolvedTimeZone::utc();
        assert_eq!(tz.name, "UTC");
        assert_eq!(tz.offset.local_minus_utc(), 0);
    }

    #[test]
    fn rejects_unknown_zone() {
        assert!(ResolvedTimeZone::resolve("Not/AZone", &SystemClock).is_err());
    }

    #[test]
    fn resolves_named_zone() {
        let tz = ResolvedTimeZone::resolve("Pacific/Honolulu", &SystemClock).unwrap();
        // Honolulu is a fixed UTC-10, no DST.
        assert_eq!(tz.offset.local_minus_utc(), -10 * 3600);
    }
}
