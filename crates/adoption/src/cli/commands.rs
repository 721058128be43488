use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;
use tracing::debug;

use crate::cli::display::{
  render_availability, render_history_entry, render_summary, render_table,
};
use crate::config::{data_dir, Config};
use crate::dataset::{load_companies, DataSource};
use crate::filter::FilterState;
use crate::history::{FileStore, QueryHistory};
use crate::query::capability::{probe, SETUP_GUIDE_URL};
use crate::query::http::HttpLanguageModel;
use crate::query::{Availability, AvailabilityMonitor, LanguageModel, QueryService};
use crate::sort::{SortState, Sorter};
use crate::view::{build_view, ExpandedRows};

/// What to show and how, shared by `list` and `ask`
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
  /// Dataset location overriding the configured one
  pub data: Option<String>,
  pub filter: FilterState,
  pub sort: SortState,
  /// Show source details under every row
  pub details: bool,
  /// 1-based row numbers whose source details should be shown
  pub expand: Vec<usize>,
}

impl ListOptions {
  fn expanded_rows(&self, shown: usize) -> ExpandedRows {
    if self.details {
      return (0..shown).collect();
    }
    self.expand.iter().filter(|row| **row >= 1).map(|row| row - 1).collect()
  }
}

pub async fn list(config: &Config, options: &ListOptions) -> Result<()> {
  let location = options.data.as_deref().unwrap_or(&config.data_url);
  let source = DataSource::parse(location);
  let companies = load_companies(&source, config.timeout())
    .await
    .with_context(|| format!("データを読み込めませんでした ({})", source.describe()))?;

  let sorter = Sorter::japanese()?;
  let view = build_view(&companies, &options.filter, options.sort, &sorter);

  if view.rows.is_empty() {
    println!("{}", "条件に一致する企業はありません".yellow());
  } else {
    let expanded = options.expanded_rows(view.shown());
    print!("{}", render_table(&view, options.sort, &expanded));
  }
  println!();
  println!("{}", render_summary(&view));

  Ok(())
}

fn open_history() -> Result<QueryHistory> {
  let dir = data_dir()?;
  debug!(dir = %dir.display(), "opening query history");
  Ok(QueryHistory::load(Box::new(FileStore::new(dir))))
}

fn local_model(config: &Config) -> Result<Arc<dyn LanguageModel>> {
  let model = HttpLanguageModel::from_config(&config.model, config.timeout())?;
  Ok(Arc::new(model))
}

fn print_guidance(status: Availability) {
  if let Some(guidance) = status.guidance() {
    println!("{}", guidance.yellow());
  }
  if status == Availability::Unavailable {
    println!("セットアップ方法: {}", SETUP_GUIDE_URL.blue().underline());
  }
}

/// Natural-language search. The query is turned into filters by the local
/// model, merged into `options.filter`, then the table is listed.
pub async fn ask(config: &Config, query: &str, options: ListOptions) -> Result<()> {
  if query.trim().is_empty() {
    println!("{}", "検索クエリを入力してください".yellow());
    return Ok(());
  }

  let model = local_model(config)?;
  let status = probe(Some(model.as_ref())).await;
  if status == Availability::Unavailable {
    println!("{}", render_availability(status));
    print_guidance(status);
    return Ok(());
  }
  if !status.is_available() {
    print_guidance(status);
  }

  let mut session_options = config.model.session_options();
  session_options.monitor = Some(Arc::new(|fraction: f64| {
    eprintln!("{} {:.0}%", "ダウンロード中".dimmed(), fraction * 100.0);
  }));

  let service = QueryService::new(Some(model), open_history()?).with_options(session_options);
  let Some(outcome) = service.run(query).await else {
    return Ok(());
  };

  if let Some(error) = &outcome.error {
    println!("{} {}", "!".red(), error.red());
  }
  println!("{} {}", "検索条件:".cyan(), outcome.fragment());
  if !outcome.parsed.unknown_tools.is_empty() {
    println!(
      "{} {}",
      "未対応のツール:".dimmed(),
      outcome.parsed.unknown_tools.join(", ").dimmed()
    );
  }
  println!();

  let filter = outcome.apply_to(options.filter.clone());
  list(config, &ListOptions { filter, ..options }).await
}

pub async fn status(config: &Config, watch: bool) -> Result<()> {
  let model = local_model(config)?;
  println!("{} {}", "モデル:".dimmed(), config.model.name);

  if !watch {
    let status = probe(Some(model.as_ref())).await;
    println!("{}", render_availability(status));
    print_guidance(status);
    return Ok(());
  }

  let monitor = AvailabilityMonitor::spawn(model, config.model.poll_interval());
  let mut updates = monitor.subscribe();
  println!("{}", "Ctrl+C で終了".dimmed());

  loop {
    tokio::select! {
      changed = updates.changed() => {
        if changed.is_err() {
          break;
        }
        let status = *updates.borrow_and_update();
        println!("{}", render_availability(status));
        print_guidance(status);
      }
      _ = tokio::signal::ctrl_c() => break,
    }
  }

  Ok(())
}

pub fn history(clear: bool) -> Result<()> {
  let mut history = open_history()?;

  if clear {
    history.clear();
    println!("{} 検索履歴を削除しました", "✓".green());
    return Ok(());
  }

  if history.is_empty() {
    println!("検索履歴はありません");
    return Ok(());
  }

  for entry in history.entries() {
    println!("{}", render_history_entry(entry));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_expand_uses_one_based_rows() {
    let options = ListOptions { expand: vec![0, 1, 3], ..ListOptions::default() };
    let expanded = options.expanded_rows(5);

    assert!(expanded.is_expanded(0));
    assert!(expanded.is_expanded(2));
    assert!(!expanded.is_expanded(1));
  }

  #[test]
  fn test_details_expands_every_row() {
    let options = ListOptions { details: true, ..ListOptions::default() };
    let expanded = options.expanded_rows(3);

    assert!((0..3).all(|row| expanded.is_expanded(row)));
    assert!(!expanded.is_expanded(3));
  }
}
