//! Calendar months used by the monthly summary.
//!
//! A [`MonthPeriod`] is a half-open range `[1st of month, 1st of next month)`
//! evaluated at local midnight in the configured timezone.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{EngineError, ResultEngine};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidPeriod(format!("invalid month: {month}")));
        }
        if !(1970..=9999).contains(&year) {
            return Err(EngineError::InvalidPeriod(format!("invalid year: {year}")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `now` in the given timezone.
    #[must_use]
    pub fn containing(now: DateTime<Utc>, tz: Tz) -> Self {
        let local = now.with_timezone(&tz);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    #[must_use]
    pub fn current(tz: Tz) -> Self {
        Self::containing(Utc::now(), tz)
    }

    /// Parses `YYYY-MM` or `MM/YYYY`.
    pub fn parse(input: &str) -> ResultEngine<Self> {
        let invalid = || EngineError::InvalidPeriod(format!("expected YYYY-MM, got '{input}'"));
        let trimmed = input.trim();

        let (year, month) = if let Some((y, m)) = trimmed.split_once('-') {
            (y, m)
        } else if let Some((m, y)) = trimmed.split_once('/') {
            (y, m)
        } else {
            return Err(invalid());
        };

        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    #[must_use]
    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// UTC bounds `[start, end)` of the month in the given timezone.
    pub fn bounds(self, tz: Tz) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
        let start = local_month_start(self, tz)?;
        let end = local_month_start(self.next(), tz)?;
        Ok((start, end))
    }

    /// Human label, e.g. `October 2026`.
    #[must_use]
    pub fn label(self) -> String {
        let idx = usize::try_from(self.month.saturating_sub(1)).unwrap_or_default();
        format!("{} {}", MONTH_NAMES[idx.min(11)], self.year)
    }
}

impl std::fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn local_month_start(period: MonthPeriod, tz: Tz) -> ResultEngine<DateTime<Utc>> {
    tz.with_ymd_and_hms(period.year, period.month, 1, 0, 0, 0)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            EngineError::InvalidPeriod(format!("no local midnight for {period} in {tz}"))
        })
}

#[cfg(test)]
mod tests {
    use chrono_tz::Europe::Rome;

    use super::*;

    #[test]
    fn parses_both_formats() {
        assert_eq!(MonthPeriod::parse("2026-09").unwrap(), MonthPeriod::new(2026, 9).unwrap());
        assert_eq!(MonthPeriod::parse("9/2026").unwrap(), MonthPeriod::new(2026, 9).unwrap());
        assert!(MonthPeriod::parse("2026-13").is_err());
        assert!(MonthPeriod::parse("26-01").is_err());
        assert!(MonthPeriod::parse("september").is_err());
    }

    #[test]
    fn signs_are_not_digits() {
        assert!(MonthPeriod::parse("2026-+9").is_err());
        assert!(MonthPeriod::parse("+9/2026").is_err());
        assert!(MonthPeriod::parse("2026--1").is_err());
    }

    #[test]
    fn prev_and_next_wrap_years() {
        let jan = MonthPeriod::new(2026, 1).unwrap();
        assert_eq!(jan.prev(), MonthPeriod::new(2025, 12).unwrap());
        assert_eq!(jan.prev().next(), jan);
        assert_eq!(MonthPeriod::new(2026, 12).unwrap().next().to_string(), "2027-01");
    }

    #[test]
    fn bounds_are_local_midnights() {
        let (start, end) = MonthPeriod::new(2026, 10).unwrap().bounds(Rome).unwrap();
        // Rome is UTC+2 on Oct 1st and UTC+1 on Nov 1st.
        assert_eq!(start.to_rfc3339(), "2026-09-30T22:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-10-31T23:00:00+00:00");
    }

    #[test]
    fn containing_uses_local_date() {
        let late_utc = Utc.with_ymd_and_hms(2026, 9, 30, 23, 30, 0).unwrap();
        assert_eq!(
            MonthPeriod::containing(late_utc, Rome),
            MonthPeriod::new(2026, 10).unwrap()
        );
        assert_eq!(MonthPeriod::new(2026, 10).unwrap().label(), "October 2026");
    }
}
