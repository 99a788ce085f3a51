//! As-of lookups over soldier history rows.
//!
//! A snapshot is effective from its `history_date` until the next snapshot for
//! the same soldier. Input rows may arrive in any order.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::soldier::SoldierSnapshot;

fn by_user(snapshots: &[SoldierSnapshot]) -> BTreeMap<&str, Vec<&SoldierSnapshot>> {
  let mut grouped: BTreeMap<&str, Vec<&SoldierSnapshot>> = BTreeMap::new();
  for s in snapshots {
    grouped.entry(s.user_id.as_str()).or_default().push(s);
  }
  for rows in grouped.values_mut() {
    rows.sort_by_key(|s| s.history_date);
  }
  grouped
}

/// The snapshot of a single soldier effective at `at`.
pub fn snapshot_as_of(
  snapshots: &[SoldierSnapshot],
  at:        DateTime<Utc>,
) -> Option<&SoldierSnapshot> {
  snapshots
    .iter()
    .filter(|s| s.history_date <= at)
    .max_by_key(|s| s.history_date)
}

/// For every soldier, the snapshot effective at the end of `on`.
pub fn as_of_all(
  snapshots: &[SoldierSnapshot],
  on:        NaiveDate,
) -> BTreeMap<String, SoldierSnapshot> {
  by_user(snapshots)
    .into_iter()
    .filter_map(|(user, rows)| {
      rows
        .into_iter()
        .rev()
        .find(|s| s.history_date.date_naive() <= on)
        .map(|s| (user.to_owned(), s.clone()))
    })
    .collect()
}

/// Soldiers who held a qualifying snapshot at any point in `[start, end]`.
///
/// The candidates for each soldier are the snapshot already in force when the
/// range opens plus every snapshot recorded inside it. The soldier is
/// attributed to the latest candidate that satisfies `qualifies`.
pub fn assigned_during<F>(
  snapshots: &[SoldierSnapshot],
  start:     NaiveDate,
  end:       NaiveDate,
  qualifies: F,
) -> BTreeMap<String, SoldierSnapshot>
where
  F: Fn(&SoldierSnapshot) -> bool,
{
  let mut out = BTreeMap::new();
  for (user, rows) in by_user(snapshots) {
    let in_force = rows
      .iter()
      .rev()
      .find(|s| s.history_date.date_naive() < start)
      .copied();
    let inside = rows.iter().copied().filter(|s| {
      let d = s.history_date.date_naive();
      d >= start && d <= end
    });

    if let Some(latest) = in_force.into_iter().chain(inside).filter(|s| qualifies(s)).last() {
      out.insert(user.to_owned(), latest.clone());
    }
  }
  out
}

/// The date the soldier's latest contiguous run of snapshots in `uic` began.
///
/// `None` when the soldier's newest snapshot is not in `uic`.
pub fn arrival_at_unit(snapshots: &[SoldierSnapshot], uic: &str) -> Option<NaiveDate> {
  let mut rows: Vec<&SoldierSnapshot> = snapshots.iter().collect();
  rows.sort_by_key(|s| s.history_date);

  rows
    .iter()
    .rev()
    .take_while(|s| s.unit_uic == uic)
    .last()
    .map(|s| s.history_date.date_naive())
}
