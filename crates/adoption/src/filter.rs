//! Filter state and the predicate that decides whether a company is shown.
//!
//! A company is shown when it passes all four axes: the denylist, the
//! company-name search, the single tool/status selector and the multi-tool
//! selector. Manual controls and natural-language search both end up here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::model::{AdoptionStatus, Company, ToolName};
use crate::normalize::contains_normalized;

/// A drop-down style choice: everything, or one specific value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection<T> {
  All,
  Only(T),
}

impl<T> Default for Selection<T> {
  fn default() -> Self {
    Selection::All
  }
}

impl<T: Copy> Selection<T> {
  pub fn value(&self) -> Option<T> {
    match self {
      Selection::All => None,
      Selection::Only(value) => Some(*value),
    }
  }
}

impl<T> From<Option<T>> for Selection<T> {
  fn from(value: Option<T>) -> Self {
    value.map_or(Selection::All, Selection::Only)
  }
}

/// How the multi-tool selection is combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterOperator {
  #[default]
  #[serde(rename = "AND")]
  And,
  #[serde(rename = "OR")]
  Or,
}

impl FilterOperator {
  pub fn as_str(&self) -> &'static str {
    match self {
      FilterOperator::And => "AND",
      FilterOperator::Or => "OR",
    }
  }
}

impl fmt::Display for FilterOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FilterOperator {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "AND" => Ok(FilterOperator::And),
      "OR" => Ok(FilterOperator::Or),
      _ => Err(ParseError::unknown_operator(s)),
    }
  }
}

/// Everything the user has chosen to narrow the table down
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
  pub search_term: String,
  pub selected_tool: Selection<ToolName>,
  pub selected_status: Selection<AdoptionStatus>,
  pub selected_tools: BTreeSet<ToolName>,
  pub filter_operator: FilterOperator,
}

/// Partial filter state extracted from one natural-language query.
/// Fields that are `None` were not mentioned and must not be touched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFragment {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tools: Option<Vec<ToolName>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<AdoptionStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub operator: Option<FilterOperator>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub search_term: Option<String>,
}

impl FilterFragment {
  pub fn is_empty(&self) -> bool {
    self.tools.is_none()
      && self.status.is_none()
      && self.operator.is_none()
      && self.search_term.is_none()
  }
}

impl fmt::Display for FilterFragment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      return f.write_str("(条件なし)");
    }

    let mut parts = Vec::new();
    if let Some(tools) = &self.tools {
      let names: Vec<&str> = tools.iter().map(|tool| tool.as_str()).collect();
      parts.push(format!("ツール: [{}]", names.join(", ")));
    }
    if let Some(status) = self.status {
      parts.push(format!("導入状況: {status}"));
    }
    if let Some(operator) = self.operator {
      parts.push(format!("条件: {operator}"));
    }
    if let Some(term) = &self.search_term {
      parts.push(format!("企業名: \"{term}\""));
    }
    f.write_str(&parts.join(" / "))
  }
}

/// State transitions for the filter controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
  SetSearchTerm(String),
  SelectTool(Selection<ToolName>),
  SelectStatus(Selection<AdoptionStatus>),
  /// Add the tool to the multi-tool selection, or remove it if present
  ToggleTool(ToolName),
  SetTools(Vec<ToolName>),
  SetOperator(FilterOperator),
  ApplyFragment(FilterFragment),
  Reset,
}

impl FilterState {
  /// Pure transition: consume the current state and return the next one
  pub fn reduce(mut self, action: FilterAction) -> FilterState {
    match action {
      FilterAction::SetSearchTerm(term) => self.search_term = term,
      FilterAction::SelectTool(tool) => self.selected_tool = tool,
      FilterAction::SelectStatus(status) => self.selected_status = status,
      FilterAction::ToggleTool(tool) => {
        if !self.selected_tools.remove(&tool) {
          self.selected_tools.insert(tool);
        }
      }
      FilterAction::SetTools(tools) => self.selected_tools = tools.into_iter().collect(),
      FilterAction::SetOperator(operator) => self.filter_operator = operator,
      FilterAction::ApplyFragment(fragment) => return self.merge(fragment),
      FilterAction::Reset => return FilterState::default(),
    }
    self
  }

  /// Merge a query fragment, leaving fields it does not mention untouched
  pub fn merge(mut self, fragment: FilterFragment) -> FilterState {
    if let Some(tools) = fragment.tools {
      self.selected_tools = tools.into_iter().collect();
    }
    if let Some(status) = fragment.status {
      self.selected_status = Selection::Only(status);
    }
    if let Some(operator) = fragment.operator {
      self.filter_operator = operator;
    }
    if let Some(term) = fragment.search_term {
      self.search_term = term;
    }
    self
  }

  /// True when no axis narrows the result
  pub fn is_identity(&self) -> bool {
    *self == FilterState { filter_operator: self.filter_operator, ..FilterState::default() }
  }
}

/// Decide whether one company passes every filter axis
pub fn matches(company: &Company, state: &FilterState) -> bool {
  if company.is_excluded() {
    return false;
  }

  matches_search(company, &state.search_term)
    && matches_single_tool(company, state.selected_tool, state.selected_status)
    && matches_multi_tool(
      company,
      &state.selected_tools,
      state.selected_status,
      state.filter_operator,
    )
}

/// Companies that pass the filter, in their original order
pub fn filter_companies<'a>(companies: &'a [Company], state: &FilterState) -> Vec<&'a Company> {
  companies.iter().filter(|company| matches(company, state)).collect()
}

fn matches_search(company: &Company, search_term: &str) -> bool {
  contains_normalized(&company.company_name, search_term)
}

// A tool without a status constrains nothing.
fn matches_single_tool(
  company: &Company,
  tool: Selection<ToolName>,
  status: Selection<AdoptionStatus>,
) -> bool {
  match (tool, status) {
    (Selection::Only(tool), Selection::Only(status)) => company.status(tool) == status,
    _ => true,
  }
}

fn matches_multi_tool(
  company: &Company,
  tools: &BTreeSet<ToolName>,
  status: Selection<AdoptionStatus>,
  operator: FilterOperator,
) -> bool {
  let Selection::Only(status) = status else {
    return true;
  };
  if tools.is_empty() {
    return true;
  }

  let mut hits = tools.iter().map(|tool| company.status(*tool) == status);
  match operator {
    FilterOperator::And => hits.all(|hit| hit),
    FilterOperator::Or => hits.any(|hit| hit),
  }
}
