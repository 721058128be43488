use crate::model::{AdoptionStatus, ToolName};

/// Render the instruction sent to the model for one user query.
///
/// The tool and status lists come from the enumerations so the template can
/// never offer the model a value the reply parser would reject.
pub fn render_prompt(query: &str) -> String {
  let tools: Vec<&str> = ToolName::ALL.iter().map(|tool| tool.as_str()).collect();
  let statuses: Vec<&str> = AdoptionStatus::ALL.iter().map(|status| status.as_str()).collect();

  format!(
    r#"あなたは検索クエリを解析するアシスタントです。以下のクエリから検索条件を抽出してください。

使用可能なツール: {tools}
使用可能な導入状況: {statuses}

クエリ: "{query}"

以下の形式で回答してください：
- ツール: [ツール名のリスト]
- 導入状況: 導入状況
- 条件: AND または OR（複数ツールの場合）
- 企業名: "検索する企業名"（企業名での検索の場合）

例：
クエリ: "ChatGPTとCopilotを全社導入している企業"
回答:
- ツール: ["ChatGPT", "GitHub Copilot"]
- 導入状況: 全社導入
- 条件: AND"#,
    tools = tools.join(", "),
    statuses = statuses.join(", "),
  )
}
