//! Derived table view: the rows to display and the "shown / total" counts.
//!
//! Recomputed from scratch whenever the dataset, filter or sort changes.

use std::collections::BTreeSet;

use crate::filter::{filter_companies, FilterState};
use crate::model::Company;
use crate::sort::{SortState, Sorter};

#[derive(Debug)]
pub struct DashboardView<'a> {
  pub rows: Vec<&'a Company>,
  /// Size of the full dataset, excluded company included
  pub total: usize,
}

impl DashboardView<'_> {
  pub fn shown(&self) -> usize {
    self.rows.len()
  }

  pub fn summary(&self) -> String {
    format!("{} / {} 企業を表示中", self.shown(), self.total)
  }
}

pub fn build_view<'a>(
  companies: &'a [Company],
  filter: &FilterState,
  sort: SortState,
  sorter: &Sorter,
) -> DashboardView<'a> {
  let mut rows = filter_companies(companies, filter);
  sorter.sort(&mut rows, sort);
  DashboardView { rows, total: companies.len() }
}

/// Which rows have their source details open, keyed by table position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedRows {
  open: BTreeSet<usize>,
}

impl ExpandedRows {
  pub fn toggle(&mut self, index: usize) {
    if !self.open.remove(&index) {
      self.open.insert(index);
    }
  }

  pub fn is_expanded(&self, index: usize) -> bool {
    self.open.contains(&index)
  }

  pub fn collapse_all(&mut self) {
    self.open.clear();
  }
}

impl FromIterator<usize> for ExpandedRows {
  fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
    Self { open: iter.into_iter().collect() }
  }
}
