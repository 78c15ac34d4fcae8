//! Calendar periods: the time axis of the ledger.
//!
//! A [`Period`] is a day, a month or a year. Its textual form is exactly
//! `YYYY-MM-DD`, `YYYY-MM` or `YYYY`; that form is what stores persist and
//! what the API accepts.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Granularity ─────────────────────────────────────────────────────────────

/// The resolution of a period. Ordered from finest to coarsest.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
  Day,
  Month,
  Year,
}

impl Granularity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Day => "day",
      Self::Month => "month",
      Self::Year => "year",
    }
  }
}

impl fmt::Display for Granularity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Granularity {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "day" => Ok(Self::Day),
      "month" => Ok(Self::Month),
      "year" => Ok(Self::Year),
      _ => Err(Error::UnknownGranularity(s.to_owned())),
    }
  }
}

// ─── Period ──────────────────────────────────────────────────────────────────

/// A calendar-addressable unit at which a quantity is recorded or aggregated.
///
/// Internally a period is its first day plus its granularity, so ordering is
/// chronological; a day sorts before the month that starts on it, and a month
/// before the year that starts on it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
  start:       NaiveDate,
  granularity: Granularity,
}

impl Period {
  pub fn day(date: NaiveDate) -> Self {
    Self { start: date, granularity: Granularity::Day }
  }

  pub fn month(year: i32, month: u32) -> Result<Self> {
    NaiveDate::from_ymd_opt(year, month, 1)
      .map(|start| Self { start, granularity: Granularity::Month })
      .ok_or_else(|| Error::InvalidPeriod(format!("{year:04}-{month:02}")))
  }

  pub fn year(year: i32) -> Result<Self> {
    NaiveDate::from_ymd_opt(year, 1, 1)
      .map(|start| Self { start, granularity: Granularity::Year })
      .ok_or_else(|| Error::InvalidPeriod(format!("{year:04}")))
  }

  /// The period of the given granularity that contains `date`.
  pub fn containing(date: NaiveDate, granularity: Granularity) -> Self {
    let start = match granularity {
      Granularity::Day => date,
      Granularity::Month => date - Days::new(u64::from(date.day0())),
      Granularity::Year => date - Days::new(u64::from(date.ordinal0())),
    };
    Self { start, granularity }
  }

  pub fn granularity(&self) -> Granularity { self.granularity }

  /// First day of the period.
  pub fn start(&self) -> NaiveDate { self.start }

  /// Last day of the period (inclusive).
  pub fn end(&self) -> NaiveDate {
    match self.granularity {
      Granularity::Day => self.start,
      _ => self
        .succ()
        .and_then(|next| next.start.pred_opt())
        .unwrap_or(NaiveDate::MAX),
    }
  }

  /// Coarsen to `granularity`. Returns `None` when `granularity` is finer
  /// than this period; a month cannot be narrowed to one of its days.
  pub fn truncate(&self, granularity: Granularity) -> Option<Self> {
    (granularity >= self.granularity)
      .then(|| Self::containing(self.start, granularity))
  }

  /// Whether `other` lies entirely within this period.
  pub fn contains(&self, other: &Period) -> bool {
    other.truncate(self.granularity) == Some(*self)
  }

  /// The next period of the same granularity.
  pub fn succ(&self) -> Option<Self> {
    let start = match self.granularity {
      Granularity::Day => self.start.succ_opt(),
      Granularity::Month => self.start.checked_add_months(Months::new(1)),
      Granularity::Year => self.start.checked_add_months(Months::new(12)),
    }?;
    Some(Self { start, granularity: self.granularity })
  }

  /// Every day within this period, in order.
  pub fn days(&self) -> impl Iterator<Item = Period> + use<> {
    let end = self.end();
    std::iter::successors(Some(self.start), move |d| {
      d.succ_opt().filter(|next| *next <= end)
    })
    .map(Period::day)
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let pattern = match self.granularity {
      Granularity::Day => "%Y-%m-%d",
      Granularity::Month => "%Y-%m",
      Granularity::Year => "%Y",
    };
    write!(f, "{}", self.start.format(pattern))
  }
}

impl FromStr for Period {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let invalid = || Error::InvalidPeriod(s.to_owned());
    let digits =
      |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());

    let parts: Vec<&str> = trimmed.split('-').collect();
    match parts.as_slice() {
      [y] if digits(y, 4) => {
        Self::year(y.parse().map_err(|_| invalid())?).map_err(|_| invalid())
      }
      [y, m] if digits(y, 4) && digits(m, 2) => {
        let year = y.parse().map_err(|_| invalid())?;
        let month = m.parse().map_err(|_| invalid())?;
        Self::month(year, month).map_err(|_| invalid())
      }
      [y, m, d] if digits(y, 4) && digits(m, 2) && digits(d, 2) => {
        let year = y.parse().map_err(|_| invalid())?;
        let month = m.parse().map_err(|_| invalid())?;
        let day = d.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, day)
          .map(Self::day)
          .ok_or_else(invalid)
      }
      _ => Err(invalid()),
    }
  }
}

impl TryFrom<String> for Period {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Period> for String {
  fn from(p: Period) -> Self { p.to_string() }
}
