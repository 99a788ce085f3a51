//! Reporting periods and fiscal years.
//!
//! A reporting period runs from the 16th of one month through the 15th of the
//! next and is named after the month it ends in.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportingPeriod {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

pub(crate) fn first_of_month(d: NaiveDate) -> NaiveDate { d - Days::new(u64::from(d.day0())) }

pub(crate) fn shift_months(d: NaiveDate, n: i32) -> NaiveDate {
  if n >= 0 {
    d + Months::new(n.unsigned_abs())
  } else {
    d - Months::new(n.unsigned_abs())
  }
}

/// The reporting period containing `date`.
pub fn reporting_period(date: NaiveDate) -> ReportingPeriod {
  let first = first_of_month(date);
  if date.day() <= 15 {
    ReportingPeriod {
      start: shift_months(first, -1) + Days::new(15),
      end:   first + Days::new(14),
    }
  } else {
    ReportingPeriod {
      start: first + Days::new(15),
      end:   shift_months(first, 1) + Days::new(14),
    }
  }
}

impl ReportingPeriod {
  pub fn previous(self) -> Self {
    Self { start: shift_months(self.start, -1), end: shift_months(self.end, -1) }
  }

  pub fn next(self) -> Self {
    Self { start: shift_months(self.start, 1), end: shift_months(self.end, 1) }
  }

  pub fn contains(self, date: NaiveDate) -> bool { self.start <= date && date <= self.end }

  /// e.g. `"March 2024"` for the period ending 2024-03-15.
  pub fn label(self) -> String { self.end.format("%B %Y").to_string() }
}

/// Every period touched by a day in `[start, end)`, oldest first.
pub fn reporting_periods(start: NaiveDate, end: NaiveDate) -> Vec<ReportingPeriod> {
  let mut out = Vec::new();
  if start >= end {
    return out;
  }
  let mut p = reporting_period(start);
  while p.start < end {
    out.push(p);
    p = p.next();
  }
  out
}

/// Same calendar day two years earlier; Feb 29 falls back to Feb 28.
pub fn two_years_prior(date: NaiveDate) -> NaiveDate { date - Months::new(24) }

/// Fiscal years start on 1 October and are named for the year they end in.
pub fn fiscal_year(date: NaiveDate) -> i32 {
  if date.month() >= 10 { date.year() + 1 } else { date.year() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[test]
  fn period_boundaries() {
    let p = reporting_period(ymd(2024, 3, 15));
    assert_eq!((p.start, p.end), (ymd(2024, 2, 16), ymd(2024, 3, 15)));

    let p = reporting_period(ymd(2024, 3, 16));
    assert_eq!((p.start, p.end), (ymd(2024, 3, 16), ymd(2024, 4, 15)));

    let p = reporting_period(ymd(2024, 1, 3));
    assert_eq!((p.start, p.end), (ymd(2023, 12, 16), ymd(2024, 1, 15)));

    let p = reporting_period(ymd(2024, 12, 20));
    assert_eq!((p.start, p.end), (ymd(2024, 12, 16), ymd(2025, 1, 15)));
  }

  #[test]
  fn previous_and_label() {
    let p = reporting_period(ymd(2024, 3, 1)).previous();
    assert_eq!((p.start, p.end), (ymd(2024, 1, 16), ymd(2024, 2, 15)));
    assert_eq!(p.label(), "February 2024");
  }

  #[test]
  fn periods_cover_half_open_range() {
    let ps = reporting_periods(ymd(2024, 1, 10), ymd(2024, 3, 16));
    let ends: Vec<_> = ps.iter().map(|p| p.end).collect();
    assert_eq!(ends, vec![ymd(2024, 1, 15), ymd(2024, 2, 15), ymd(2024, 3, 15)]);

    let ps = reporting_periods(ymd(2024, 1, 10), ymd(2024, 3, 17));
    assert_eq!(ps.len(), 4);

    assert!(reporting_periods(ymd(2024, 1, 10), ymd(2024, 1, 10)).is_empty());
  }

  #[test]
  fn leap_day_two_years_back() {
    assert_eq!(two_years_prior(ymd(2024, 2, 29)), ymd(2022, 2, 28));
    assert_eq!(two_years_prior(ymd(2024, 7, 4)), ymd(2022, 7, 4));
  }

  #[test]
  fn fiscal_year_rolls_in_october() {
    assert_eq!(fiscal_year(ymd(2024, 9, 30)), 2024);
    assert_eq!(fiscal_year(ymd(2024, 10, 1)), 2025);
  }
}
