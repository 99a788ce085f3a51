//! MTOE authorizations.

use serde::{Deserialize, Serialize};

/// One authorized position line for a unit in a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtoePosition {
  pub uic:                 String,
  /// Full year, e.g. 2025 for October 2024 through September 2025.
  pub fiscal_year:         i32,
  pub position_code:       String,
  pub authorized_strength: u32,
  pub required_strength:   u32,
  #[serde(default)]
  pub asi_codes:           Vec<String>,
}

impl MtoePosition {
  /// The MOS the position authorizes. Numeric-led codes (e.g. `"1530A"`)
  /// carry a four-character MOS, the rest three.
  pub fn mos(&self) -> String {
    let code = self.position_code.as_str();
    let head: String = code.chars().take(3).collect();
    if head.len() == 3 && head.chars().all(|c| c.is_ascii_digit()) {
      code.chars().take(4).collect()
    } else {
      head
    }
  }
}

/// Sum of authorized strength for `mos` across `positions`.
pub fn authorized_for(positions: &[MtoePosition], mos: &str) -> u32 {
  positions
    .iter()
    .filter(|p| p.mos() == mos)
    .map(|p| p.authorized_strength)
    .sum()
}
