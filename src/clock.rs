// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Injectable clock for deterministic "today" in tests.
//!
//! Daily point caps are keyed to the civil date in `America/New_York`
//! (DST-aware), not UTC. All date reads go through the [`Clock`] trait so
//! tests can pin the wall clock.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::America::New_York;

/// Source of the current time, held in `AppState` as `Arc<dyn Clock>`.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Today's civil date as observed in US-Eastern time.
    fn eastern_date(&self) -> NaiveDate {
        self.now_utc().with_timezone(&New_York).date_naive()
    }

    /// Today's Eastern date formatted `YYYY-MM-DD`, the key for daily caps.
    fn eastern_date_string(&self) -> String {
        self.eastern_date().format("%Y-%m-%d").to_string()
    }

    /// Current UTC instant as RFC3339 with a `Z` suffix.
    fn now_rfc3339(&self) -> String {
        self.now_utc().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed instant for tests.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_rfc3339(instant: &str) -> Self {
        Self(
            DateTime::parse_from_rfc3339(instant)
                .expect("valid RFC3339 instant")
                .with_timezone(&Utc),
        )
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eastern_date_crosses_midnight_before_utc() {
        // 04:59 UTC on Jan 1 is still 23:59 EST on Dec 31
        let clock = FixedClock::at_rfc3339("2024-01-01T04:59:00Z");
        assert_eq!(clock.eastern_date_string(), "2023-12-31");

        let clock = FixedClock::at_rfc3339("2024-01-01T05:00:00Z");
        assert_eq!(clock.eastern_date_string(), "2024-01-01");
    }

    #[test]
    fn test_eastern_date_is_dst_aware() {
        // During EDT the offset is -04:00, so the date flips at 04:00 UTC
        let clock = FixedClock::at_rfc3339("2024-07-10T03:59:00Z");
        assert_eq!(clock.eastern_date_string(), "2024-07-09");

        let clock = FixedClock::at_rfc3339("2024-07-10T04:00:00Z");
        assert_eq!(clock.eastern_date_string(), "2024-07-10");
    }

    #[test]
    fn test_rfc3339_uses_z_suffix() {
        let clock = FixedClock::at_rfc3339("2024-01-15T10:30:00Z");
        assert_eq!(clock.now_rfc3339(), "2024-01-15T10:30:00Z");
    }
}
