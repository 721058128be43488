use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The one company that is never shown, whatever the filters say
pub const EXCLUDED_COMPANY: &str = "レバレジーズ株式会社";

/// The fixed set of tools tracked by the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ToolName {
  Cursor,
  Devin,
  #[serde(rename = "GitHub Copilot")]
  GitHubCopilot,
  ChatGPT,
  #[serde(rename = "Claude Code")]
  ClaudeCode,
}

impl ToolName {
  /// All tools in dataset column order
  pub const ALL: [ToolName; 5] = [
    ToolName::Cursor,
    ToolName::Devin,
    ToolName::GitHubCopilot,
    ToolName::ChatGPT,
    ToolName::ClaudeCode,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ToolName::Cursor => "Cursor",
      ToolName::Devin => "Devin",
      ToolName::GitHubCopilot => "GitHub Copilot",
      ToolName::ChatGPT => "ChatGPT",
      ToolName::ClaudeCode => "Claude Code",
    }
  }
}

impl fmt::Display for ToolName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ToolName {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ToolName::ALL
      .iter()
      .copied()
      .find(|tool| tool.as_str() == s)
      .ok_or_else(|| ParseError::unknown_tool(s))
  }
}

/// How thoroughly a company has adopted one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdoptionStatus {
  #[serde(rename = "全社導入")]
  CompanyWide,
  #[serde(rename = "一部導入")]
  Partial,
  #[serde(rename = "導入してない")]
  NotAdopted,
}

impl AdoptionStatus {
  pub const ALL: [AdoptionStatus; 3] =
    [AdoptionStatus::CompanyWide, AdoptionStatus::Partial, AdoptionStatus::NotAdopted];

  pub fn as_str(&self) -> &'static str {
    match self {
      AdoptionStatus::CompanyWide => "全社導入",
      AdoptionStatus::Partial => "一部導入",
      AdoptionStatus::NotAdopted => "導入してない",
    }
  }
}

impl fmt::Display for AdoptionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AdoptionStatus {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    AdoptionStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| ParseError::unknown_status(s))
  }
}

/// Adoption status for every tool. All five keys are required when
/// deserializing, so a record can never be missing a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatuses {
  #[serde(rename = "Cursor")]
  pub cursor: AdoptionStatus,
  #[serde(rename = "Devin")]
  pub devin: AdoptionStatus,
  #[serde(rename = "GitHub Copilot")]
  pub github_copilot: AdoptionStatus,
  #[serde(rename = "ChatGPT")]
  pub chatgpt: AdoptionStatus,
  #[serde(rename = "Claude Code")]
  pub claude_code: AdoptionStatus,
}

impl ToolStatuses {
  /// Every tool at the same status
  pub fn uniform(status: AdoptionStatus) -> Self {
    Self {
      cursor: status,
      devin: status,
      github_copilot: status,
      chatgpt: status,
      claude_code: status,
    }
  }

  pub fn get(&self, tool: ToolName) -> AdoptionStatus {
    match tool {
      ToolName::Cursor => self.cursor,
      ToolName::Devin => self.devin,
      ToolName::GitHubCopilot => self.github_copilot,
      ToolName::ChatGPT => self.chatgpt,
      ToolName::ClaudeCode => self.claude_code,
    }
  }

  pub fn set(&mut self, tool: ToolName, status: AdoptionStatus) {
    let slot = match tool {
      ToolName::Cursor => &mut self.cursor,
      ToolName::Devin => &mut self.devin,
      ToolName::GitHubCopilot => &mut self.github_copilot,
      ToolName::ChatGPT => &mut self.chatgpt,
      ToolName::ClaudeCode => &mut self.claude_code,
    };
    *slot = status;
  }

  /// Builder-style variant of [`ToolStatuses::set`]
  pub fn with(mut self, tool: ToolName, status: AdoptionStatus) -> Self {
    self.set(tool, status);
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = (ToolName, AdoptionStatus)> + '_ {
    ToolName::ALL.iter().map(move |tool| (*tool, self.get(*tool)))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
  pub company_name: String,
  pub tools: ToolStatuses,
  /// Plain text interleaved with `[label](url)` links
  #[serde(default)]
  pub source: String,
}

impl Company {
  pub fn new(company_name: impl Into<String>, tools: ToolStatuses) -> Self {
    Self { company_name: company_name.into(), tools, source: String::new() }
  }

  pub fn with_source(mut self, source: impl Into<String>) -> Self {
    self.source = source.into();
    self
  }

  pub fn status(&self, tool: ToolName) -> AdoptionStatus {
    self.tools.get(tool)
  }

  /// True for the denylisted company
  pub fn is_excluded(&self) -> bool {
    self.company_name == EXCLUDED_COMPANY
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_company_deserializes_from_dataset_json() {
    let json = r#"{
      "company_name": "株式会社サンプル",
      "tools": {
        "Cursor": "全社導入",
        "Devin": "導入してない",
        "GitHub Copilot": "一部導入",
        "ChatGPT": "全社導入",
        "Claude Code": "導入してない"
      },
      "source": "[ブログ](https://example.com/blog)"
    }"#;

    let company: Company = serde_json::from_str(json).unwrap();
    assert_eq!(company.company_name, "株式会社サンプル");
    assert_eq!(company.status(ToolName::Cursor), AdoptionStatus::CompanyWide);
    assert_eq!(company.status(ToolName::GitHubCopilot), AdoptionStatus::Partial);
    assert_eq!(company.status(ToolName::ClaudeCode), AdoptionStatus::NotAdopted);
  }

  #[test]
  fn test_company_missing_tool_is_rejected() {
    let json = r#"{
      "company_name": "欠損株式会社",
      "tools": {
        "Cursor": "全社導入",
        "Devin": "導入してない",
        "ChatGPT": "全社導入",
        "Claude Code": "導入してない"
      },
      "source": ""
    }"#;

    let result: Result<Company, _> = serde_json::from_str(json);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("GitHub Copilot"));
  }

  #[test]
  fn test_unknown_status_is_rejected() {
    let json = r#"{"Cursor": "検討中", "Devin": "導入してない", "GitHub Copilot": "一部導入",
      "ChatGPT": "全社導入", "Claude Code": "導入してない"}"#;
    assert!(serde_json::from_str::<ToolStatuses>(json).is_err());
  }

  #[test]
  fn test_tool_name_from_str_is_exact() {
    assert_eq!("GitHub Copilot".parse::<ToolName>().unwrap(), ToolName::GitHubCopilot);
    assert_eq!(
      "github copilot".parse::<ToolName>().unwrap_err(),
      ParseError::unknown_tool("github copilot")
    );
    assert!("Notion".parse::<ToolName>().is_err());
  }

  #[test]
  fn test_status_from_str() {
    assert_eq!("一部導入".parse::<AdoptionStatus>().unwrap(), AdoptionStatus::Partial);
    assert!("all".parse::<AdoptionStatus>().is_err());
  }

  #[test]
  fn test_tool_statuses_set_and_iter() {
    let statuses = ToolStatuses::uniform(AdoptionStatus::NotAdopted)
      .with(ToolName::Devin, AdoptionStatus::CompanyWide);

    let adopted: Vec<ToolName> = statuses
      .iter()
      .filter(|(_, status)| *status == AdoptionStatus::CompanyWide)
      .map(|(tool, _)| tool)
      .collect();

    assert_eq!(adopted, vec![ToolName::Devin]);
    assert_eq!(statuses.iter().count(), 5);
  }

  #[test]
  fn test_excluded_company() {
    let company = Company::new(EXCLUDED_COMPANY, ToolStatuses::uniform(AdoptionStatus::Partial));
    assert!(company.is_excluded());
    assert!(!Company::new("別の会社", company.tools).is_excluded());
  }
}
