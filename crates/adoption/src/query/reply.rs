//! Best-effort extraction of filter fields from a model reply.
//!
//! The reply is read line by line. Each rule is tried on every line and the
//! first match of a field wins. Nothing here fails: lines that match no rule
//! are collected in `ignored_lines`, tool names outside the closed set in
//! `unknown_tools`, and a reply matching nothing gives an empty fragment.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::filter::{FilterFragment, FilterOperator};
use crate::model::{AdoptionStatus, ToolName};

static TOOLS_LINE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"ツール[:：]\s*\[(.*?)\]").expect("valid tools pattern"));
static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"導入状況[:：]\s*(全社導入|一部導入|導入してない)").expect("valid status pattern")
});
static OPERATOR_LINE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"条件[:：]\s*(AND|OR)").expect("valid operator pattern"));
static COMPANY_LINE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"企業名[:：]\s*"([^"]+)""#).expect("valid company pattern"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
  pub fragment: FilterFragment,
  pub ignored_lines: Vec<String>,
  pub unknown_tools: Vec<String>,
}

pub fn parse_reply(reply: &str) -> ParsedReply {
  let mut parsed = ParsedReply::default();

  for line in reply.lines() {
    let mut recognised = false;
    recognised |= read_tools(line, &mut parsed);
    recognised |= read_status(line, &mut parsed.fragment);
    recognised |= read_operator(line, &mut parsed.fragment);
    recognised |= read_company(line, &mut parsed.fragment);

    if !recognised && !line.trim().is_empty() {
      parsed.ignored_lines.push(line.trim().to_string());
    }
  }

  parsed
}

fn read_tools(line: &str, parsed: &mut ParsedReply) -> bool {
  let Some(captures) = TOOLS_LINE.captures(line) else {
    return false;
  };
  if parsed.fragment.tools.is_some() {
    return true;
  }

  let mut tools = Vec::new();
  for token in captures[1].split(',') {
    let name = token.trim().replace('"', "");
    if name.is_empty() {
      continue;
    }
    match name.parse::<ToolName>() {
      Ok(tool) if !tools.contains(&tool) => tools.push(tool),
      Ok(_) => {}
      Err(_) => parsed.unknown_tools.push(name),
    }
  }

  parsed.fragment.tools = Some(tools);
  true
}

fn read_status(line: &str, fragment: &mut FilterFragment) -> bool {
  let Some(captures) = STATUS_LINE.captures(line) else {
    return false;
  };
  if fragment.status.is_none() {
    fragment.status = captures[1].parse::<AdoptionStatus>().ok();
  }
  true
}

fn read_operator(line: &str, fragment: &mut FilterFragment) -> bool {
  let Some(captures) = OPERATOR_LINE.captures(line) else {
    return false;
  };
  if fragment.operator.is_none() {
    fragment.operator = captures[1].parse::<FilterOperator>().ok();
  }
  true
}

fn read_company(line: &str, fragment: &mut FilterFragment) -> bool {
  let Some(captures) = COMPANY_LINE.captures(line) else {
    return false;
  };
  if fragment.search_term.is_none() {
    fragment.search_term = Some(captures[1].to_string());
  }
  true
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parses_tools_status_and_operator() {
    let parsed =
      parse_reply("- ツール: [\"ChatGPT\", \"GitHub Copilot\"]\n- 導入状況: 全社導入\n- 条件: AND");

    assert_eq!(
      parsed.fragment,
      FilterFragment {
        tools: Some(vec![ToolName::ChatGPT, ToolName::GitHubCopilot]),
        status: Some(AdoptionStatus::CompanyWide),
        operator: Some(FilterOperator::And),
        search_term: None,
      }
    );
    assert!(parsed.ignored_lines.is_empty());
    assert!(parsed.unknown_tools.is_empty());
  }

  #[test]
  fn test_unknown_tools_are_dropped() {
    let parsed = parse_reply("- ツール: [\"Notion\", \"Cursor\", \"Slack\"]");

    assert_eq!(parsed.fragment.tools, Some(vec![ToolName::Cursor]));
    assert_eq!(parsed.unknown_tools, vec!["Notion", "Slack"]);
  }

  #[test]
  fn test_company_name_feeds_search() {
    let parsed = parse_reply("回答:\n- 企業名: \"サイバー\"\n- 導入状況: 一部導入");

    assert_eq!(parsed.fragment.search_term.as_deref(), Some("サイバー"));
    assert_eq!(parsed.fragment.status, Some(AdoptionStatus::Partial));
    assert_eq!(parsed.ignored_lines, vec!["回答:"]);
  }

  #[test]
  fn test_reply_without_grammar_is_empty_fragment() {
    let parsed = parse_reply("すみません、よくわかりません。\n\nもう一度お願いします。");

    assert!(parsed.fragment.is_empty());
    assert_eq!(parsed.ignored_lines.len(), 2);
  }

  #[test]
  fn test_empty_reply() {
    assert_eq!(parse_reply(""), ParsedReply::default());
  }

  #[test]
  fn test_first_match_wins() {
    let parsed = parse_reply("- 導入状況: 一部導入\n- 導入状況: 全社導入\n- 条件: OR\n- 条件: AND");

    assert_eq!(parsed.fragment.status, Some(AdoptionStatus::Partial));
    assert_eq!(parsed.fragment.operator, Some(FilterOperator::Or));
  }

  #[test]
  fn test_full_width_colon_and_unquoted_tools() {
    let parsed = parse_reply("- ツール：[Devin, Claude Code]\n- 条件：OR");

    assert_eq!(parsed.fragment.tools, Some(vec![ToolName::Devin, ToolName::ClaudeCode]));
    assert_eq!(parsed.fragment.operator, Some(FilterOperator::Or));
  }

  #[test]
  fn test_empty_tool_list_is_present_but_empty() {
    let parsed = parse_reply("- ツール: []");
    assert_eq!(parsed.fragment.tools, Some(vec![]));
    assert!(parsed.unknown_tools.is_empty());
  }

  #[test]
  fn test_duplicate_tools_collapse() {
    let parsed = parse_reply("- ツール: [\"Cursor\", \"Cursor\"]");
    assert_eq!(parsed.fragment.tools, Some(vec![ToolName::Cursor]));
  }

  #[test]
  fn test_invalid_status_literal_is_ignored() {
    let parsed = parse_reply("- 導入状況: 検討中\n- 条件: XOR");

    assert!(parsed.fragment.is_empty());
    assert_eq!(parsed.ignored_lines, vec!["- 導入状況: 検討中", "- 条件: XOR"]);
  }
}
