//! Plants, lines and the roster that bounds them.

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! identifier {
  ($(#[$meta:meta])* $name:ident, $what:literal) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(try_from = "String", into = "String")]
    pub struct $name(String);

    impl $name {
      /// Trims surrounding whitespace; rejects an empty result.
      pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
          return Err(Error::EmptyIdentifier($what));
        }
        Ok(Self(trimmed.to_owned()))
      }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl TryFrom<String> for $name {
      type Error = Error;

      fn try_from(s: String) -> Result<Self> { Self::new(s) }
    }

    impl From<$name> for String {
      fn from(id: $name) -> Self { id.0 }
    }
  };
}

identifier!(
  /// A manufacturing facility; the top-level scope of the ledger.
  Plant,
  "plant"
);

identifier!(
  /// A production line within a plant. Line names are only unique per plant.
  Line,
  "line"
);

// ─── Roster ──────────────────────────────────────────────────────────────────

/// The fixed set of plants and their lines that submissions may target.
///
/// An empty roster admits every plant and line. A plant listed without
/// lines closes the roster all the same: it is known, but admits no line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(BTreeMap<Plant, BTreeSet<Line>>);

impl Roster {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insertion.
  pub fn with_line(mut self, plant: Plant, line: Line) -> Self {
    self.insert(plant, line);
    self
  }

  pub fn insert(&mut self, plant: Plant, line: Line) {
    self.0.entry(plant).or_default().insert(line);
  }

  /// Register `plant` with no lines of its own yet.
  pub fn insert_plant(&mut self, plant: Plant) { self.0.entry(plant).or_default(); }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn plants(&self) -> impl Iterator<Item = &Plant> { self.0.keys() }

  pub fn lines(&self, plant: &Plant) -> impl Iterator<Item = &Line> {
    self.0.get(plant).into_iter().flatten()
  }

  pub fn check_plant(&self, plant: &Plant) -> Result<()> {
    if self.is_empty() || self.0.contains_key(plant) {
      Ok(())
    } else {
      Err(Error::UnknownPlant(plant.to_string()))
    }
  }

  pub fn check(&self, plant: &Plant, line: &Line) -> Result<()> {
    if self.is_empty() {
      return Ok(());
    }
    match self.0.get(plant) {
      None => Err(Error::UnknownPlant(plant.to_string())),
      Some(lines) if lines.contains(line) => Ok(()),
      Some(_) => Err(Error::UnknownLine {
        plant: plant.to_string(),
        line:  line.to_string(),
      }),
    }
  }
}
