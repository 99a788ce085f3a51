//! A small builder for `WHERE` clauses whose shape depends on optional
//! filters.

use rusqlite::types::Value;

/// Accumulates `AND`-joined conditions together with their positional
/// parameters.
#[derive(Debug, Default)]
pub struct Filter {
  conds:  Vec<String>,
  params: Vec<Value>,
}

impl Filter {
  pub fn new() -> Self { Self::default() }

  /// Add a condition with `?` placeholders bound to `params`, in order.
  pub fn push(&mut self, cond: impl Into<String>, params: impl IntoIterator<Item = Value>) {
    self.conds.push(cond.into());
    self.params.extend(params);
  }

  /// `col IN (?, ...)`. An empty list matches nothing.
  pub fn push_in(&mut self, col: &str, values: &[String]) {
    self.push(in_list(col, values.len()), values.iter().cloned().map(Value::Text));
  }

  pub fn where_clause(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }

  pub fn into_params(self) -> Vec<Value> { self.params }
}

/// `col IN (?, ?, ...)` with `n` placeholders, or a constant false for `n == 0`.
pub fn in_list(col: &str, n: usize) -> String {
  if n == 0 {
    return "0".to_owned();
  }
  let marks = vec!["?"; n].join(", ");
  format!("{col} IN ({marks})")
}

pub fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_filter_has_no_where() {
    assert_eq!(Filter::new().where_clause(), "");
  }

  #[test]
  fn conditions_and_params_stay_aligned() {
    let mut f = Filter::new();
    f.push_in("unit_uic", &["A".into(), "B".into()]);
    f.push("flag_deleted = 0", []);
    f.push("start_date <= ?", [text("2024-01-31")]);
    assert_eq!(
      f.where_clause(),
      "WHERE unit_uic IN (?, ?) AND flag_deleted = 0 AND start_date <= ?"
    );
    assert_eq!(f.into_params().len(), 3);
  }

  #[test]
  fn empty_in_list_matches_nothing() {
    assert_eq!(in_list("uic", 0), "0");
  }
}
