//! Application-timezone clock and range math.
//!
//! The process-wide timezone is the one piece of global mutable state the
//! system carries: set once at startup, read on every request.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ServiceError;

/// Half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Range {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }
}

/// Application-timezone clock. `Clone`-cheap; holds only the resolved `Tz`.
#[derive(Debug, Clone)]
pub struct TimeProvider {
    zone: Tz,
}

impl TimeProvider {
    /// Resolve an IANA zone name (`APP_TIMEZONE`). Falls back to UTC on an
    /// unrecognized name — callers validate at config-load time instead of
    /// propagating this as a per-request error.
    pub fn new(iana_name: &str) -> Self {
        let zone: Tz = iana_name.parse().unwrap_or(chrono_tz::UTC);
        Self { zone }
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn in_zone(&self, t: DateTime<Utc>) -> DateTime<Tz> {
        t.with_timezone(&self.zone)
    }

    pub fn day_of(&self, t: DateTime<Utc>) -> NaiveDate {
        self.in_zone(t).date_naive()
    }

    /// Parse `"YYYYMMDD"` into a calendar date, with no timezone attached.
    pub fn parse_day(&self, s: &str) -> Result<NaiveDate, ServiceError> {
        NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| ServiceError::InvalidArgument(format!("invalid date: {s}")))
    }

    /// Parse `"YYYYMMDD"` as midnight-in-zone, returned as a UTC instant.
    pub fn parse_date(&self, s: &str) -> Result<DateTime<Utc>, ServiceError> {
        let naive = self.parse_day(s)?;
        self.midnight_utc(naive)
    }

    fn midnight_utc(&self, naive: NaiveDate) -> Result<DateTime<Utc>, ServiceError> {
        let local = naive
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ServiceError::Internal("invalid midnight".to_string()))?;
        match self.zone.from_local_datetime(&local) {
            chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            chrono::LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
            chrono::LocalResult::None => Err(ServiceError::InvalidArgument(
                "date falls in a DST gap".to_string(),
            )),
        }
    }

    pub fn day_range(&self, day: NaiveDate) -> Result<Range, ServiceError> {
        let start = self.midnight_utc(day)?;
        let end = self.midnight_utc(day + ChronoDuration::days(1))?;
        Ok(Range { start, end })
    }

    pub fn month_range(&self, year: i32, month: u32) -> Result<Range, ServiceError> {
        if !(1..=12).contains(&month) {
            return Err(ServiceError::InvalidArgument(format!("month out of range: {month}")));
        }
        self.validate_year(year)?;

        let start_naive = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ServiceError::InvalidArgument("invalid year/month".to_string()))?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let end_naive = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| ServiceError::InvalidArgument("invalid year/month".to_string()))?;

        Ok(Range {
            start: self.midnight_utc(start_naive)?,
            end: self.midnight_utc(end_naive)?,
        })
    }

    pub fn year_range(&self, year: i32) -> Result<Range, ServiceError> {
        self.validate_year(year)?;
        let start_naive = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ServiceError::InvalidArgument("invalid year".to_string()))?;
        let end_naive = NaiveDate::from_ymd_opt(year + 1, 1, 1)
            .ok_or_else(|| ServiceError::InvalidArgument("invalid year".to_string()))?;
        Ok(Range {
            start: self.midnight_utc(start_naive)?,
            end: self.midnight_utc(end_naive)?,
        })
    }

    /// ISO-8601 week range. Week 1 is the week containing January 4th;
    /// weeks run Monday..Monday.
    pub fn iso_week_range(&self, year: i32, week: u32) -> Result<Range, ServiceError> {
        if !(1..=53).contains(&week) {
            return Err(ServiceError::InvalidArgument(format!("week out of range: {week}")));
        }
        self.validate_year(year)?;

        let start_naive = NaiveDate::from_isoywd_opt(year, week, chrono::Weekday::Mon)
            .ok_or_else(|| ServiceError::InvalidArgument("invalid ISO week".to_string()))?;

        let iso = start_naive.iso_week();
        if iso.year() != year || iso.week() != week {
            return Err(ServiceError::InvalidArgument(
                "ISO week derivation drifted from the requested (year, week)".to_string(),
            ));
        }

        let end_naive = start_naive + ChronoDuration::days(7);
        Ok(Range {
            start: self.midnight_utc(start_naive)?,
            end: self.midnight_utc(end_naive)?,
        })
    }

    fn validate_year(&self, year: i32) -> Result<(), ServiceError> {
        if !(2000..=9999).contains(&year) {
            return Err(ServiceError::InvalidArgument(format!("year out of range: {year}")));
        }
        Ok(())
    }

    /// Whether `now()` falls within `range` — used to pick "current" vs
    /// "past" TTL tiers for rankings/archive caches.
    pub fn is_current(&self, range: &Range) -> bool {
        range.contains(self.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp() -> TimeProvider {
        TimeProvider::new("Asia/Tokyo")
    }

    #[test]
    fn day_range_is_half_open_24h() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let r = tp().day_range(d).unwrap();
        assert_eq!(r.end - r.start, ChronoDuration::days(1));
    }

    #[test]
    fn month_out_of_range_errors() {
        assert!(tp().month_range(2025, 13).is_err());
        assert!(tp().month_range(2025, 0).is_err());
    }

    #[test]
    fn week_out_of_range_errors() {
        assert!(tp().iso_week_range(2025, 0).is_err());
        assert!(tp().iso_week_range(2025, 54).is_err());
    }

    #[test]
    fn year_out_of_range_errors() {
        assert!(tp().year_range(1999).is_err());
        assert!(tp().year_range(10000).is_err());
    }

    #[test]
    fn iso_week_one_contains_jan_4() {
        // 2025-01-04 is a Saturday, in ISO week 1 of 2025.
        let r = tp().iso_week_range(2025, 1).unwrap();
        let jan4 = tp().parse_date("20250104").unwrap();
        assert!(r.contains(jan4));
    }

    #[test]
    fn parse_date_round_trips_to_day_of() {
        let t = tp().parse_date("20250105").unwrap();
        assert_eq!(tp().day_of(t).to_string(), "2025-01-05");
    }
}
