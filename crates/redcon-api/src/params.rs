//! Query-string shapes shared by the report endpoints.

use chrono::{NaiveDate, Utc};
use redcon_core::error::check_range;
use serde::Deserialize;

use crate::error::ApiError;

/// `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateRange {
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
}

impl DateRange {
  /// The bounds, rejecting an inverted range with 422.
  pub fn checked(self) -> Result<(NaiveDate, NaiveDate), ApiError> {
    check_range(self.start_date, self.end_date)?;
    Ok((self.start_date, self.end_date))
  }
}

/// `?start_date=...&end_date=...` where both bounds are optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OptionalRange {
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

impl OptionalRange {
  /// Fill missing bounds from `default`, then check the order.
  pub fn or(self, default: (NaiveDate, NaiveDate)) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let start = self.start_date.unwrap_or(default.0);
    let end = self.end_date.unwrap_or(default.1);
    check_range(start, end)?;
    Ok((start, end))
  }
}

/// `?date=YYYY-MM-DD&mos=15R,15T`; the date defaults to today.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnDate {
  pub date: Option<NaiveDate>,
  /// Comma-separated MOS codes.
  pub mos:  Option<String>,
}

impl OnDate {
  pub fn date(&self) -> NaiveDate { self.date.unwrap_or_else(today) }

  pub fn mos_codes(&self) -> Option<Vec<String>> { self.mos.as_deref().map(comma_list) }
}

/// Split `15R, 15T,,` into `["15R", "15T"]`.
pub fn comma_list(list: &str) -> Vec<String> {
  list
    .split(',')
    .map(str::trim)
    .filter(|m| !m.is_empty())
    .map(str::to_owned)
    .collect()
}

pub fn today() -> NaiveDate { Utc::now().date_naive() }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mos_list_is_split_and_trimmed() {
    let q = OnDate { date: None, mos: Some("15R, 15T,,".into()) };
    assert_eq!(q.mos_codes(), Some(vec!["15R".to_owned(), "15T".to_owned()]));
  }

  #[test]
  fn inverted_range_is_rejected() {
    let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let range = DateRange { start_date: start, end_date: end };
    assert!(matches!(range.checked(), Err(ApiError::Unprocessable(_))));
  }
}
