use assert_cmd::prelude::*;

use predicates::prelude::*;
use predicates::str::contains;
use serial_test::serial;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn fixture_path() -> String {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests/fixtures/companies.json")
    .display()
    .to_string()
}

/// `adoption` with an isolated home, no colour and no reachable model
fn adoption_cmd(home: &TempDir) -> Command {
  let mut cmd = Command::cargo_bin("adoption").expect("binary exists");
  cmd.env("ADOPTION_HOME", home.path());
  cmd.env("ADOPTION_MODEL_URL", "http://127.0.0.1:9");
  cmd.env("ADOPTION_TIMEOUT_SECS", "2");
  cmd.env("NO_COLOR", "1");
  cmd.env_remove("ADOPTION_DATA_URL");
  cmd.env_remove("RUST_LOG");
  cmd
}

#[test]
#[serial]
fn test_list_shows_table_and_summary() {
  let home = TempDir::new().unwrap();

  adoption_cmd(&home)
    .args(["list", "--data", &fixture_path()])
    .assert()
    .success()
    .stdout(contains("企業名 ↑"))
    .stdout(contains("株式会社メルカリ").and(contains("Sansan株式会社")))
    .stdout(contains("レバレジーズ株式会社").not())
    .stdout(contains("5 / 6 企業を表示中"));
}

#[test]
#[serial]
fn test_list_with_multi_tool_filter() {
  let home = TempDir::new().unwrap();

  adoption_cmd(&home)
    .args([
      "list",
      "--data",
      &fixture_path(),
      "--tools",
      "ChatGPT,Cursor",
      "--operator",
      "or",
      "--status",
      "全社導入",
      "--sort",
      "ChatGPT",
      "--desc",
    ])
    .assert()
    .success()
    .stdout(contains("ChatGPT ↓"))
    .stdout(contains("サイボウズ株式会社").not())
    .stdout(contains("3 / 6 企業を表示中"));
}

#[test]
#[serial]
fn test_list_expands_source_details() {
  let home = TempDir::new().unwrap();

  adoption_cmd(&home)
    .args(["list", "--data", &fixture_path(), "--search", "sansan", "--expand", "1"])
    .assert()
    .success()
    .stdout(contains("ソース: 採用ページ <https://jp.corp-sansan.com/recruit/>"))
    .stdout(contains("1 / 6 企業を表示中"));
}

#[test]
#[serial]
fn test_list_with_no_matches() {
  let home = TempDir::new().unwrap();

  adoption_cmd(&home)
    .args(["list", "--data", &fixture_path(), "--search", "存在しない会社"])
    .assert()
    .success()
    .stdout(contains("条件に一致する企業はありません"))
    .stdout(contains("0 / 6 企業を表示中"));
}

#[test]
#[serial]
fn test_missing_dataset_fails() {
  let home = TempDir::new().unwrap();
  let missing = home.path().join("nope.json");

  adoption_cmd(&home)
    .args(["list", "--data", &missing.display().to_string()])
    .assert()
    .failure()
    .stderr(contains("データを読み込めませんでした"));
}

#[test]
#[serial]
fn test_unknown_tool_is_rejected() {
  let home = TempDir::new().unwrap();

  adoption_cmd(&home)
    .args(["list", "--data", &fixture_path(), "--tool", "Notion"])
    .assert()
    .failure()
    .stderr(contains("Unknown tool name 'Notion'"));
}

#[test]
#[serial]
fn test_status_without_model_server() {
  let home = TempDir::new().unwrap();

  adoption_cmd(&home)
    .arg("status")
    .assert()
    .success()
    .stdout(contains("利用不可"))
    .stdout(contains("サポートされていません"));
}

#[test]
#[serial]
fn test_ask_without_model_server_leaves_history_empty() {
  let home = TempDir::new().unwrap();

  adoption_cmd(&home)
    .args(["ask", "--data", &fixture_path(), "ChatGPTを全社導入している企業"])
    .assert()
    .success()
    .stdout(contains("利用不可"));

  adoption_cmd(&home).arg("history").assert().success().stdout(contains("検索履歴はありません"));
}

#[test]
#[serial]
fn test_history_clear() {
  let home = TempDir::new().unwrap();
  std::fs::write(
    home.path().join("query_history.json"),
    r#"[{"id":"1-0","timestamp":"2025-06-01T00:00:00Z","query":"Devin","prompt":"p","response":"- ツール: [\"Devin\"]","parsedFilters":{"tools":["Devin"]},"durationMs":42}]"#,
  )
  .unwrap();

  adoption_cmd(&home)
    .arg("history")
    .assert()
    .success()
    .stdout(contains("Devin").and(contains("(42ms)")))
    .stdout(contains("ツール: [Devin]"));

  adoption_cmd(&home).args(["history", "--clear"]).assert().success();

  adoption_cmd(&home).arg("history").assert().success().stdout(contains("検索履歴はありません"));
}
