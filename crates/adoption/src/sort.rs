use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{ParseError, SortError};
use crate::model::{Company, ToolName};

/// Column the table is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
  CompanyName,
  Tool(ToolName),
}

impl fmt::Display for SortField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SortField::CompanyName => f.write_str("company_name"),
      SortField::Tool(tool) => write!(f, "{tool}"),
    }
  }
}

impl FromStr for SortField {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == "company_name" {
      return Ok(SortField::CompanyName);
    }
    s.parse::<ToolName>().map(SortField::Tool).map_err(|_| ParseError::unknown_sort_field(s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  pub fn toggled(self) -> Self {
    match self {
      SortDirection::Asc => SortDirection::Desc,
      SortDirection::Desc => SortDirection::Asc,
    }
  }

  /// Arrow shown next to the active column header
  pub fn indicator(self) -> &'static str {
    match self {
      SortDirection::Asc => "↑",
      SortDirection::Desc => "↓",
    }
  }
}

/// Active sort column and direction, with header-click semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
  pub field: SortField,
  pub direction: SortDirection,
}

impl Default for SortState {
  fn default() -> Self {
    Self { field: SortField::CompanyName, direction: SortDirection::Asc }
  }
}

impl SortState {
  pub fn new(field: SortField, direction: SortDirection) -> Self {
    Self { field, direction }
  }

  /// Clicking the active column flips direction; any other column starts ascending
  pub fn toggle(self, field: SortField) -> Self {
    if self.field == field {
      Self { field, direction: self.direction.toggled() }
    } else {
      Self { field, direction: SortDirection::Asc }
    }
  }

  pub fn indicator_for(&self, field: SortField) -> Option<&'static str> {
    (self.field == field).then(|| self.direction.indicator())
  }
}

/// Orders companies with Japanese locale collation.
///
/// Tool columns compare the status strings themselves, so the order of
/// statuses is whatever the collator says, not an adoption ranking.
pub struct Sorter {
  collator: Collator,
}

impl Sorter {
  pub fn japanese() -> Result<Self, SortError> {
    let collator = Collator::try_new(&locale!("ja").into(), CollatorOptions::new())
      .map_err(|e| SortError::collator_unavailable(e.to_string()))?;
    Ok(Self { collator })
  }

  pub fn compare(
    &self,
    a: &Company,
    b: &Company,
    field: SortField,
    direction: SortDirection,
  ) -> Ordering {
    let ordering = self.collator.compare(sort_key(a, field), sort_key(b, field));
    match direction {
      SortDirection::Asc => ordering,
      SortDirection::Desc => ordering.reverse(),
    }
  }

  /// Stable in-place sort; rows with equal keys keep their relative order
  pub fn sort<C: Borrow<Company>>(&self, rows: &mut [C], state: SortState) {
    rows.sort_by(|a, b| self.compare(a.borrow(), b.borrow(), state.field, state.direction));
  }
}

fn sort_key(company: &Company, field: SortField) -> &str {
  match field {
    SortField::CompanyName => &company.company_name,
    SortField::Tool(tool) => company.status(tool).as_str(),
  }
}
