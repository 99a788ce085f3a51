//! Units and the organisational hierarchy.
//!
//! Every unit stores its own `parent_uic`. The derived lists (`parent_uics`,
//! `child_uics`, `subordinate_uics`) and `level` are recomputed for the whole
//! tree by [`UnitTree::build`] whenever a unit is written, so reads never have
//! to walk the tree.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

// ─── Codes ───────────────────────────────────────────────────────────────────

/// Echelon codes as carried on the unit record.
///
/// Squadrons are stored as battalions, troops as companies.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Echelon {
  Tm,
  Sqd,
  Sec,
  Plt,
  Det,
  Co,
  Act,
  Aug,
  Bn,
  Bde,
  Div,
  Corps,
  Macom,
  Cntr,
  Army,
  Elemt,
  Fms,
  Group,
  Sch,
  Dru,
  Ascc,
  Acom,
  Hq,
  Dir,
  Inst,
  Ofc,
  Tf,
  Agency,
  Milsvc,
  State,
  Facility,
  Msc,
  Uc,
  Container,
  #[default]
  Unk,
}

impl Echelon {
  pub fn display_name(self) -> &'static str {
    match self {
      Self::Tm => "Team",
      Self::Sqd => "Squad",
      Self::Sec => "Section",
      Self::Plt => "Platoon",
      Self::Det => "Detachment",
      Self::Co => "Company",
      Self::Act => "Activity",
      Self::Aug => "Augmentation",
      Self::Bn => "Battalion",
      Self::Bde => "Brigade",
      Self::Div => "Division",
      Self::Corps => "Corps",
      Self::Macom => "Major Command",
      Self::Cntr => "Center",
      Self::Army => "Army",
      Self::Elemt => "Element",
      Self::Fms => "Field Maintenance Shop",
      Self::Group => "Group",
      Self::Sch => "Army School",
      Self::Dru => "Direct Reporting Unit",
      Self::Ascc => "Army Service Component Command",
      Self::Acom => "Army Command",
      Self::Hq => "Headquarters",
      Self::Dir => "Directorate",
      Self::Inst => "Institute",
      Self::Ofc => "Office",
      Self::Tf => "Task Force",
      Self::Agency => "Agency",
      Self::Milsvc => "Military Service",
      Self::State => "State Army National Guard",
      Self::Facility => "Aviation Support Facility",
      Self::Msc => "Major Subordinate Command",
      Self::Uc => "Unified Command",
      Self::Container => "Container",
      Self::Unk => "Unknown",
    }
  }

  /// Company-level echelons take their flight-hour projections from the
  /// parent unit.
  pub fn is_company(self) -> bool { matches!(self, Self::Co) }
}

/// Army component.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  EnumString, AsRefStr, Display,
)]
pub enum Component {
  #[serde(rename = "1")]
  #[strum(serialize = "1")]
  Active,
  #[serde(rename = "2")]
  #[strum(serialize = "2")]
  Guard,
  #[serde(rename = "3")]
  #[strum(serialize = "3")]
  Reserve,
  #[serde(rename = "TF")]
  #[strum(serialize = "TF")]
  TaskForce,
  #[default]
  #[serde(rename = "UNK")]
  #[strum(serialize = "UNK")]
  Unknown,
}

// ─── Unit ────────────────────────────────────────────────────────────────────

/// Caller-supplied unit fields. The hierarchy fields are derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUnit {
  pub uic:          String,
  pub short_name:   String,
  pub display_name: String,
  pub nick_name:    Option<String>,
  #[serde(default)]
  pub echelon:      Echelon,
  #[serde(default)]
  pub component:    Component,
  pub state:        Option<String>,
  pub parent_uic:   Option<String>,
  pub start_date:   Option<NaiveDate>,
  pub end_date:     Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
  pub uic:              String,
  pub short_name:       String,
  pub display_name:     String,
  pub nick_name:        Option<String>,
  pub echelon:          Echelon,
  pub component:        Component,
  pub state:            Option<String>,
  pub parent_uic:       Option<String>,
  pub start_date:       Option<NaiveDate>,
  pub end_date:         Option<NaiveDate>,
  /// Depth in the tree; roots are level 0.
  pub level:            u32,
  /// Ancestors, nearest first.
  pub parent_uics:      Vec<String>,
  /// Direct children only.
  pub child_uics:       Vec<String>,
  /// Every descendant, breadth-first.
  pub subordinate_uics: Vec<String>,
}

impl From<NewUnit> for Unit {
  fn from(n: NewUnit) -> Self {
    Unit {
      uic:              n.uic,
      short_name:       n.short_name,
      display_name:     n.display_name,
      nick_name:        n.nick_name,
      echelon:          n.echelon,
      component:        n.component,
      state:            n.state,
      parent_uic:       n.parent_uic,
      start_date:       n.start_date,
      end_date:         n.end_date,
      level:            0,
      parent_uics:      Vec::new(),
      child_uics:       Vec::new(),
      subordinate_uics: Vec::new(),
    }
  }
}

impl Unit {
  /// This unit followed by its ancestors, nearest first.
  pub fn lineage(&self) -> Vec<String> {
    std::iter::once(self.uic.clone())
      .chain(self.parent_uics.iter().cloned())
      .collect()
  }

  /// This unit followed by every descendant.
  pub fn with_subordinates(&self) -> Vec<String> {
    std::iter::once(self.uic.clone())
      .chain(self.subordinate_uics.iter().cloned())
      .collect()
  }
}

// ─── Tree ────────────────────────────────────────────────────────────────────

/// A fully derived unit hierarchy keyed by UIC.
#[derive(Debug, Clone, Default)]
pub struct UnitTree {
  units: BTreeMap<String, Unit>,
}

impl UnitTree {
  /// Recompute the derived fields of every unit from its `parent_uic`.
  ///
  /// A `parent_uic` naming an unknown unit (or the unit itself) is treated as
  /// absent. Children keep the order in which they appear in `units`.
  pub fn build(units: Vec<Unit>) -> Result<Self> {
    let known: HashSet<String> = units.iter().map(|u| u.uic.clone()).collect();

    let parent_of: HashMap<String, String> = units
      .iter()
      .filter_map(|u| {
        u.parent_uic
          .as_ref()
          .filter(|p| *p != &u.uic && known.contains(*p))
          .map(|p| (u.uic.clone(), p.clone()))
      })
      .collect();

    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    for u in &units {
      if let Some(p) = parent_of.get(&u.uic) {
        children.entry(p.clone()).or_default().push(u.uic.clone());
      }
    }

    let mut out = BTreeMap::new();
    for mut unit in units {
      let mut ancestors = Vec::new();
      let mut seen = HashSet::from([unit.uic.clone()]);
      let mut cursor = parent_of.get(&unit.uic);
      while let Some(p) = cursor {
        if !seen.insert(p.clone()) {
          return Err(Error::HierarchyCycle(unit.uic));
        }
        ancestors.push(p.clone());
        cursor = parent_of.get(p);
      }

      let mut subordinates = Vec::new();
      let mut queue: VecDeque<&String> =
        children.get(&unit.uic).into_iter().flatten().collect();
      while let Some(uic) = queue.pop_front() {
        subordinates.push(uic.clone());
        queue.extend(children.get(uic).into_iter().flatten());
      }

      unit.level            = ancestors.len() as u32;
      unit.parent_uics      = ancestors;
      unit.child_uics       = children.get(&unit.uic).cloned().unwrap_or_default();
      unit.subordinate_uics = subordinates;
      out.insert(unit.uic.clone(), unit);
    }

    tracing::debug!(units = out.len(), "rebuilt unit hierarchy");
    Ok(Self { units: out })
  }

  pub fn get(&self, uic: &str) -> Option<&Unit> { self.units.get(uic) }

  pub fn into_units(self) -> Vec<Unit> { self.units.into_values().collect() }
}
