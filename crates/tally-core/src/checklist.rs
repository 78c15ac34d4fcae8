//! Monthly maintenance checklist: a grid of fixed tasks by month.
//!
//! Each cell holds the sign-off of the operator and the shift engineer who
//! performed the task that month. In a sheet, tasks are rows 2–5 and months
//! are columns 2–13; row 1 and column 1 hold headers.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

// ─── Task ────────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
pub enum ChecklistTask {
  #[serde(rename = "DISMANTLE, CHECK AND CLEAN VALVES")]
  #[strum(serialize = "DISMANTLE, CHECK AND CLEAN VALVES")]
  CleanValves,
  #[serde(rename = "CLEAN AIR GOVERNOR")]
  #[strum(serialize = "CLEAN AIR GOVERNOR")]
  CleanAirGovernor,
  #[serde(rename = "CHECK ALL BOLTS AND NUTS")]
  #[strum(serialize = "CHECK ALL BOLTS AND NUTS")]
  CheckBoltsAndNuts,
  #[serde(rename = "CHECK UNLOADED PISTON OPERATION")]
  #[strum(serialize = "CHECK UNLOADED PISTON OPERATION")]
  CheckUnloadedPiston,
}

impl ChecklistTask {
  pub fn label(self) -> &'static str { self.into() }

  /// 1-based sheet row.
  pub fn row(self) -> u32 {
    match self {
      Self::CleanValves => 2,
      Self::CleanAirGovernor => 3,
      Self::CheckBoltsAndNuts => 4,
      Self::CheckUnloadedPiston => 5,
    }
  }

  pub fn from_row(row: u32) -> Option<Self> {
    Self::iter().find(|t| t.row() == row)
  }
}

impl fmt::Display for ChecklistTask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for ChecklistTask {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim();
    Self::iter()
      .find(|t| t.label().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| Error::UnknownTask(s.to_owned()))
  }
}

// ─── Month ───────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Month {
  Jan,
  Feb,
  Mar,
  Apr,
  May,
  June,
  July,
  Aug,
  Sept,
  Oct,
  Nov,
  Dec,
}

impl Month {
  pub fn label(self) -> &'static str { self.into() }

  /// Calendar number, 1 = January.
  pub fn number(self) -> u32 { self as u32 + 1 }

  pub fn from_number(n: u32) -> Option<Self> {
    Self::iter().find(|m| m.number() == n)
  }

  /// 1-based sheet column.
  pub fn column(self) -> u32 { self.number() + 1 }

  pub fn from_column(column: u32) -> Option<Self> {
    column.checked_sub(1).and_then(Self::from_number)
  }
}

impl fmt::Display for Month {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Month {
  type Err = Error;

  /// Accepts the checklist label (`"SEPT"`, case-insensitive) or the month
  /// number (`"9"`, `"09"`).
  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim();
    if let Ok(n) = wanted.parse::<u32>() {
      return Self::from_number(n).ok_or_else(|| Error::UnknownMonth(s.to_owned()));
    }
    Self::iter()
      .find(|m| m.label().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| Error::UnknownMonth(s.to_owned()))
  }
}

// ─── Sign-off ────────────────────────────────────────────────────────────────

/// Who performed and who verified a checklist task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOff {
  pub operator: String,
  pub engineer: String,
}

impl SignOff {
  pub fn new(operator: impl AsRef<str>, engineer: impl AsRef<str>) -> Result<Self> {
    let operator = operator.as_ref().trim();
    let engineer = engineer.as_ref().trim();
    if operator.is_empty() {
      return Err(Error::EmptyIdentifier("operator signature"));
    }
    if engineer.is_empty() {
      return Err(Error::EmptyIdentifier("shift engineer signature"));
    }
    if operator.contains('|') {
      return Err(Error::SeparatorInSignature("operator signature"));
    }
    if engineer.contains('|') {
      return Err(Error::SeparatorInSignature("shift engineer signature"));
    }
    Ok(Self { operator: operator.to_owned(), engineer: engineer.to_owned() })
  }
}

/// The sheet cell form: `"operator | engineer"`.
impl fmt::Display for SignOff {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} | {}", self.operator, self.engineer)
  }
}

impl FromStr for SignOff {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let (operator, engineer) = s
      .split_once('|')
      .ok_or_else(|| Error::InvalidSignOff(s.to_owned()))?;
    Self::new(operator, engineer).map_err(|_| Error::InvalidSignOff(s.to_owned()))
  }
}

// ─── Grid ────────────────────────────────────────────────────────────────────

/// Signed cells of the checklist; unsigned cells are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistGrid(BTreeMap<ChecklistTask, BTreeMap<Month, SignOff>>);

/// One task's row, with every month present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistRow {
  pub task:  ChecklistTask,
  pub cells: BTreeMap<Month, Option<SignOff>>,
}

impl ChecklistGrid {
  pub fn new() -> Self { Self::default() }

  /// Overwrite one cell; returns the previous sign-off.
  pub fn set(&mut self, task: ChecklistTask, month: Month, sign_off: SignOff) -> Option<SignOff> {
    self.0.entry(task).or_default().insert(month, sign_off)
  }

  pub fn get(&self, task: ChecklistTask, month: Month) -> Option<&SignOff> {
    self.0.get(&task).and_then(|row| row.get(&month))
  }

  pub fn signed_count(&self) -> usize { self.0.values().map(BTreeMap::len).sum() }

  /// Every task with every month, unsigned months as `None`.
  pub fn rows(&self) -> Vec<ChecklistRow> {
    ChecklistTask::iter()
      .map(|task| ChecklistRow {
        task,
        cells: Month::iter()
          .map(|m| (m, self.get(task, m).cloned()))
          .collect(),
      })
      .collect()
  }
}
