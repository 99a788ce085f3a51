//! Phase teams: the soldiers assigned to a phase inspection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The team for the phase maintenance event `phase_id`. One team per phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTeam {
  pub phase_id:                     Uuid,
  pub phase_lead_user_id:           String,
  pub assistant_phase_lead_user_id: String,
  /// Members other than the lead and assistant lead.
  #[serde(default)]
  pub phase_members:                Vec<String>,
}

impl PhaseTeam {
  /// Reject a team whose lead doubles as assistant, and drop leads and
  /// repeats from the member list.
  pub fn normalized(mut self) -> Result<Self> {
    if self.phase_lead_user_id == self.assistant_phase_lead_user_id {
      return Err(Error::InvalidPhaseTeam(
        "phase lead and assistant phase lead must differ".into(),
      ));
    }
    let mut seen = BTreeSet::new();
    let (lead, asst) = (&self.phase_lead_user_id, &self.assistant_phase_lead_user_id);
    self
      .phase_members
      .retain(|m| m != lead && m != asst && seen.insert(m.clone()));
    Ok(self)
  }

  /// Everyone on the team, leads first.
  pub fn everyone(&self) -> Vec<String> {
    [self.phase_lead_user_id.clone(), self.assistant_phase_lead_user_id.clone()]
      .into_iter()
      .chain(self.phase_members.iter().cloned())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn team(lead: &str, asst: &str, members: &[&str]) -> PhaseTeam {
    PhaseTeam {
      phase_id:                     Uuid::nil(),
      phase_lead_user_id:           lead.into(),
      assistant_phase_lead_user_id: asst.into(),
      phase_members:                members.iter().map(|m| m.to_string()).collect(),
    }
  }

  #[test]
  fn members_exclude_leads_and_repeats() {
    let t = team("1", "2", &["3", "1", "3", "2", "4"]).normalized().unwrap();
    assert_eq!(t.phase_members, vec!["3", "4"]);
    assert_eq!(t.everyone(), vec!["1", "2", "3", "4"]);
  }

  #[test]
  fn lead_cannot_be_assistant() {
    assert!(matches!(team("1", "1", &[]).normalized(), Err(Error::InvalidPhaseTeam(_))));
  }
}
