//! Calendar month arithmetic.
//!
//! Projections are keyed by calendar month, so most date math in the engine is done on
//! [`YearMonth`] values and only turned into a concrete [`NaiveDate`] once the due day
//! has been clamped to the month length.

use crate::errors::{Error, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a month, rejecting month numbers outside 1..=12 and years chrono cannot
    /// represent.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The month `count` months after this one.
    #[must_use]
    pub const fn add_months(self, count: u32) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) + count as i64;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// The following month.
    #[must_use]
    pub const fn succ(self) -> Self {
        self.add_months(1)
    }

    /// First day of the month.
    pub fn first_day(self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or(Error::InvalidMonth {
            year: self.year,
            month: self.month,
        })
    }

    /// Last day of the month, accounting for leap years.
    pub fn last_day(self) -> Result<NaiveDate> {
        self.succ()
            .first_day()
            .ok()
            .and_then(|next| next.pred_opt())
            .ok_or(Error::InvalidMonth {
                year: self.year,
                month: self.month,
            })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Computes the calendar date a template with `due_day` falls due in the given month.
///
/// Due days past the end of the month clamp to its last day (31 in February becomes the
/// 28th or 29th), and non-positive due days clamp to the 1st.
///
/// # Errors
/// Returns [`Error::InvalidMonth`] if `month` is not in 1..=12.
pub fn calculate_actual_due_date(due_day: i32, year: i32, month: u32) -> Result<NaiveDate> {
    let target = YearMonth::new(year, month)?;
    let last_day = target.last_day()?;

    let day = u32::try_from(due_day).unwrap_or(1).clamp(1, last_day.day());
    last_day.with_day(day).ok_or(Error::InvalidMonth { year, month })
}
