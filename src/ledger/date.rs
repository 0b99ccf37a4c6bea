//! Calendar date handling without timezone dependencies.
//!
//! Provides a lightweight `Date` struct for ledger entry dates,
//! parsed from the ISO `YYYY-MM-DD` form every dated directive starts with.
//!
//! # Features
//!
//! - Zero external dependencies for date parsing
//! - Validation with clear error messages
//! - Leap year handling
//! - Total ordering for query-time date comparisons

use anyhow::{Result, bail};
use std::fmt;

/// Calendar date in the proleptic Gregorian calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Parse from "YYYY-MM-DD" format
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 10 {
            return None;
        }

        let year = parse_u16(&bytes[0..4])?;
        if bytes[4] != b'-' {
            return None;
        }
        let month = parse_u8(&bytes[5..7])?;
        if bytes[7] != b'-' {
            return None;
        }
        let day = parse_u8(&bytes[8..10])?;

        let date = Self::new(year, month, day);
        date.validate().ok()?;
        Some(date)
    }

    pub fn validate(self) -> Result<()> {
        let Self { year, month, day } = self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }

        let max_days = Self::days_in_month(year, month);
        if day == 0 || day > max_days {
            bail!("day is invalid: {day}");
        }

        Ok(())
    }

    /// Current date in UTC, derived from the system clock.
    pub fn today() -> Self {
        use std::time::SystemTime;
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_days_since_epoch((secs / 86400) as i64)
    }

    /// Convert days since 1970-01-01 to a civil date.
    fn from_days_since_epoch(days: i64) -> Self {
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z.rem_euclid(146_097);
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let d = doy - (153 * mp + 2) / 5 + 1;
        let m = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = if m <= 2 { y + 1 } else { y };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self::new(year as u16, m as u8, d as u8)
    }

    #[inline]
    #[allow(clippy::manual_is_multiple_of)] // Manual impl for const fn
    const fn is_leap_year(year: u16) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    #[inline]
    const fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parse 2-digit ASCII number
#[inline]
fn parse_u8(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = bytes[0].wrapping_sub(b'0');
    let d2 = bytes[1].wrapping_sub(b'0');
    if d1 > 9 || d2 > 9 {
        return None;
    }
    Some(d1 * 10 + d2)
}

/// Parse 4-digit ASCII number
#[inline]
fn parse_u16(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 4 {
        return None;
    }
    let mut result = 0u16;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        result = result * 10 + u16::from(d);
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let date = Date::parse("2025-06-15").unwrap();
        assert_eq!(date, Date::new(2025, 6, 15));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Date::parse("2025-6-15"), None);
        assert_eq!(Date::parse("2025/06/15"), None);
        assert_eq!(Date::parse("not-a-date"), None);
        assert_eq!(Date::parse("2025-06-15T00"), None);
    }

    #[test]
    fn test_parse_rejects_invalid_month_day() {
        assert_eq!(Date::parse("2025-13-01"), None);
        assert_eq!(Date::parse("2025-00-01"), None);
        assert_eq!(Date::parse("2025-04-31"), None);
        assert_eq!(Date::parse("2025-01-00"), None);
    }

    #[test]
    fn test_leap_year() {
        assert!(Date::parse("2024-02-29").is_some());
        assert!(Date::parse("2000-02-29").is_some()); // divisible by 400
        assert!(Date::parse("2023-02-29").is_none());
        assert!(Date::parse("1900-02-29").is_none()); // divisible by 100 but not 400
    }

    #[test]
    fn test_ordering() {
        let a = Date::new(2024, 12, 31);
        let b = Date::new(2025, 1, 1);
        assert!(a < b);
        assert!(Date::new(2025, 1, 2) > b);
    }

    #[test]
    fn test_display_roundtrip() {
        let date = Date::parse("2025-01-05").unwrap();
        assert_eq!(date.to_string(), "2025-01-05");
    }

    #[test]
    fn test_from_days_since_epoch() {
        assert_eq!(Date::from_days_since_epoch(0), Date::new(1970, 1, 1));
        assert_eq!(Date::from_days_since_epoch(19723), Date::new(2024, 1, 1));
    }
}
