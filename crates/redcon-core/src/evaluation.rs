//! Birth-month evaluation windows.
//!
//! Maintainers are evaluated once a year in a three-month window that opens
//! on the first of the month two months before their birth month and closes
//! at the end of the birth month. A window that straddles New Year (a January
//! or February birth month) is already open in November or December.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Serialize, Serializer};

use crate::{
  period::{first_of_month, shift_months},
  soldier::BirthMonth,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthMonthWindow {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl BirthMonthWindow {
  /// The window closing in `month` of `today`'s year shifted by `years`.
  fn around(month: u32, today: NaiveDate, years: i32) -> Self {
    let offset      = month as i32 - today.month() as i32 + 12 * years;
    let birth_first = shift_months(first_of_month(today), offset);
    BirthMonthWindow {
      start: shift_months(birth_first, -2),
      end:   shift_months(birth_first, 1) - Days::new(1),
    }
  }

  pub fn contains(self, date: NaiveDate) -> bool { self.start <= date && date <= self.end }
}

/// Where `today` falls relative to a soldier's evaluation windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
  Open(BirthMonthWindow),
  /// Between windows; `last` is the most recently closed one.
  Closed { last: BirthMonthWindow },
}

/// `None` when the birth month is unknown.
pub fn locate(birth_month: BirthMonth, today: NaiveDate) -> Option<WindowState> {
  let month   = birth_month.number()?;
  let current = BirthMonthWindow::around(month, today, 0);
  let next    = BirthMonthWindow::around(month, today, 1);

  let state = if current.contains(today) {
    WindowState::Open(current)
  } else if next.contains(today) {
    WindowState::Open(next)
  } else if today > current.end {
    WindowState::Closed { last: current }
  } else {
    WindowState::Closed { last: BirthMonthWindow::around(month, today, -1) }
  };
  Some(state)
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStatus {
  MetInWindow,
  Due { days_remaining: i64 },
  MetNotInWindow,
  Overdue { days: i64 },
  BirthMonthNotSet,
}

/// Coarse grouping used by the summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationBucket {
  Met,
  Due,
  Overdue,
}

impl EvaluationStatus {
  pub fn bucket(self) -> Option<EvaluationBucket> {
    match self {
      Self::MetInWindow | Self::MetNotInWindow => Some(EvaluationBucket::Met),
      Self::Due { .. } => Some(EvaluationBucket::Due),
      Self::Overdue { .. } => Some(EvaluationBucket::Overdue),
      Self::BirthMonthNotSet => None,
    }
  }
}

impl fmt::Display for EvaluationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MetInWindow => f.write_str("Met - In Window"),
      Self::Due { days_remaining } => write!(f, "Due - {days_remaining} Days Remaining"),
      Self::MetNotInWindow => f.write_str("Met - Not in Window"),
      Self::Overdue { days } => write!(f, "Overdue (by {days} days)"),
      Self::BirthMonthNotSet => f.write_str("Birth Month Not Set"),
    }
  }
}

impl Serialize for EvaluationStatus {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

/// Status given the date of the soldier's last passed evaluation.
pub fn evaluation_status(
  birth_month: BirthMonth,
  last_go:     Option<NaiveDate>,
  today:       NaiveDate,
) -> EvaluationStatus {
  let Some(state) = locate(birth_month, today) else {
    return EvaluationStatus::BirthMonthNotSet;
  };

  match state {
    WindowState::Open(w) => {
      if last_go.is_some_and(|d| d >= w.start) {
        EvaluationStatus::MetInWindow
      } else {
        EvaluationStatus::Due { days_remaining: (w.end - today).num_days() }
      }
    }
    WindowState::Closed { last } => {
      if last_go.is_some_and(|d| d >= last.start) {
        EvaluationStatus::MetNotInWindow
      } else {
        EvaluationStatus::Overdue { days: (today - last.end).num_days() }
      }
    }
  }
}
