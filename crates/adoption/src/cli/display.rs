//! Terminal rendering for the company table and query results

use colored::*;
use console::measure_text_width;

use crate::history::QueryHistoryEntry;
use crate::model::{AdoptionStatus, ToolName};
use crate::query::Availability;
use crate::sort::{SortField, SortState};
use crate::source::{parse_source, SourceSegment};
use crate::view::{DashboardView, ExpandedRows};

const COLUMN_GAP: &str = "  ";

/// Pad to a display width. CJK characters count as two columns.
pub fn pad(text: &str, width: usize) -> String {
  let visible = measure_text_width(text);
  format!("{}{}", text, " ".repeat(width.saturating_sub(visible)))
}

pub fn status_badge(status: AdoptionStatus, width: usize) -> String {
  let cell = pad(status.as_str(), width);
  match status {
    AdoptionStatus::CompanyWide => cell.green().to_string(),
    AdoptionStatus::Partial => cell.yellow().to_string(),
    AdoptionStatus::NotAdopted => cell.dimmed().to_string(),
  }
}

fn header_label(field: SortField, sort: SortState) -> String {
  let name = match field {
    SortField::CompanyName => "企業名".to_string(),
    SortField::Tool(tool) => tool.to_string(),
  };
  match sort.indicator_for(field) {
    Some(indicator) => format!("{name} {indicator}"),
    None => name,
  }
}

/// Source text with links rendered as `label <url>`
pub fn render_source(source: &str) -> String {
  parse_source(source)
    .into_iter()
    .map(|segment| match segment {
      SourceSegment::Text(text) => text,
      SourceSegment::Link { label, url } => format!("{} <{}>", label, url.blue().underline()),
    })
    .collect()
}

pub fn render_table(view: &DashboardView<'_>, sort: SortState, expanded: &ExpandedRows) -> String {
  let index_width = view.rows.len().to_string().len().max(1);

  let name_header = header_label(SortField::CompanyName, sort);
  let name_width = view
    .rows
    .iter()
    .map(|company| measure_text_width(&company.company_name))
    .chain(std::iter::once(measure_text_width(&name_header)))
    .max()
    .unwrap_or(0);

  let tool_widths: Vec<(ToolName, String, usize)> = ToolName::ALL
    .iter()
    .map(|tool| {
      let header = header_label(SortField::Tool(*tool), sort);
      let width = AdoptionStatus::ALL
        .iter()
        .map(|status| measure_text_width(status.as_str()))
        .chain(std::iter::once(measure_text_width(&header)))
        .max()
        .unwrap_or(0);
      (*tool, header, width)
    })
    .collect();

  let mut out = String::new();

  let mut header = vec![pad("#", index_width), pad(&name_header, name_width)];
  header.extend(tool_widths.iter().map(|(_, label, width)| pad(label, *width)));
  out.push_str(&header.join(COLUMN_GAP).bold().to_string());
  out.push('\n');

  for (position, company) in view.rows.iter().enumerate() {
    let mut cells = vec![
      pad(&(position + 1).to_string(), index_width).dimmed().to_string(),
      pad(&company.company_name, name_width),
    ];
    cells.extend(
      tool_widths.iter().map(|(tool, _, width)| status_badge(company.status(*tool), *width)),
    );
    out.push_str(cells.join(COLUMN_GAP).trim_end());
    out.push('\n');

    if expanded.is_expanded(position) {
      let source = if company.source.trim().is_empty() {
        "(なし)".dimmed().to_string()
      } else {
        render_source(&company.source)
      };
      out.push_str(&format!("{}ソース: {}\n", " ".repeat(index_width + COLUMN_GAP.len()), source));
    }
  }

  out
}

pub fn render_summary(view: &DashboardView<'_>) -> String {
  view.summary().cyan().to_string()
}

pub fn render_availability(status: Availability) -> String {
  let label = match status {
    Availability::Available => status.label().green(),
    Availability::Downloading | Availability::Downloadable => status.label().yellow(),
    Availability::Unavailable => status.label().red(),
  };
  format!("{} 言語モデル: {}", status.icon(), label)
}

pub fn render_history_entry(entry: &QueryHistoryEntry) -> String {
  let mut out = format!(
    "{} {} {}\n",
    entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
    entry.query.bold(),
    format!("({}ms)", entry.duration_ms).dimmed()
  );
  out.push_str(&format!("  {} {}\n", "→".cyan(), entry.parsed_filters));
  if let Some(error) = &entry.error {
    out.push_str(&format!("  {} {}\n", "!".red(), error.red()));
  }
  out
}
