use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, warn};

use super::capability::{probe, Availability, LanguageModel, SessionOptions};
use super::prompt::render_prompt;
use super::reply::{parse_reply, ParsedReply};
use crate::error::CapabilityError;
use crate::filter::{FilterFragment, FilterState};
use crate::history::{QueryHistory, QueryHistoryEntry};

/// Shown to the user whenever the model round-trip fails
pub const SEARCH_FAILED_MESSAGE: &str = "検索中にエラーが発生しました";
/// Recorded when the model answered but nothing in the reply was usable
pub const NO_FILTERS_MESSAGE: &str = "応答から検索条件を抽出できませんでした";

/// Result of one natural-language query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
  pub ticket: u64,
  pub parsed: ParsedReply,
  /// User-facing message when the query produced nothing to apply
  pub error: Option<String>,
  /// A newer query was issued while this one was in flight
  pub stale: bool,
}

impl QueryOutcome {
  pub fn fragment(&self) -> &FilterFragment {
    &self.parsed.fragment
  }

  /// Merge the extracted fragment into `state`. Stale outcomes leave it as is.
  pub fn apply_to(&self, state: FilterState) -> FilterState {
    if self.stale {
      debug!(ticket = self.ticket, "discarding stale query outcome");
      return state;
    }
    state.merge(self.parsed.fragment.clone())
  }
}

/// Drives natural-language search: renders the prompt, calls the optional
/// model, parses the reply and records every attempt in the history.
pub struct QueryService {
  model: Option<Arc<dyn LanguageModel>>,
  options: SessionOptions,
  history: Mutex<QueryHistory>,
  issued: AtomicU64,
  in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
  fn enter(counter: &'a AtomicUsize) -> Self {
    counter.fetch_add(1, Ordering::SeqCst);
    Self(counter)
  }
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::SeqCst);
  }
}

impl QueryService {
  pub fn new(model: Option<Arc<dyn LanguageModel>>, history: QueryHistory) -> Self {
    Self {
      model,
      options: SessionOptions::default(),
      history: Mutex::new(history),
      issued: AtomicU64::new(0),
      in_flight: AtomicUsize::new(0),
    }
  }

  pub fn with_options(mut self, options: SessionOptions) -> Self {
    self.options = options;
    self
  }

  pub async fn availability(&self) -> Availability {
    probe(self.model.as_deref()).await
  }

  pub async fn is_available(&self) -> bool {
    self.availability().await.is_available()
  }

  /// True while at least one query is waiting on the model
  pub fn is_busy(&self) -> bool {
    self.in_flight.load(Ordering::SeqCst) > 0
  }

  pub fn is_latest(&self, ticket: u64) -> bool {
    self.issued.load(Ordering::SeqCst) == ticket
  }

  /// Run one query. Blank input is ignored and returns `None`; model
  /// failures are recorded and reported in the outcome, never returned.
  pub async fn run(&self, query: &str) -> Option<QueryOutcome> {
    let query = query.trim();
    if query.is_empty() {
      return None;
    }

    let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let _guard = InFlight::enter(&self.in_flight);

    let prompt = render_prompt(query);
    let started = Instant::now();
    let result = self.complete(&prompt).await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (entry, parsed, error) = match result {
      Ok(response) => {
        let parsed = parse_reply(&response);
        let mut entry =
          QueryHistoryEntry::new(query, &prompt, &response, parsed.fragment.clone(), duration_ms);
        let mut error = None;
        if parsed.fragment.is_empty() {
          entry = entry.with_error(NO_FILTERS_MESSAGE);
          error = Some(NO_FILTERS_MESSAGE.to_string());
        }
        if !parsed.unknown_tools.is_empty() {
          debug!(tools = ?parsed.unknown_tools, "dropped unknown tools from reply");
        }
        (entry, parsed, error)
      }
      Err(e) => {
        warn!(error = %e, query, "natural-language query failed");
        let entry = QueryHistoryEntry::failed(query, &prompt, e.to_string(), duration_ms);
        (entry, ParsedReply::default(), Some(SEARCH_FAILED_MESSAGE.to_string()))
      }
    };

    self.record(entry);

    Some(QueryOutcome { ticket, parsed, error, stale: !self.is_latest(ticket) })
  }

  async fn complete(&self, prompt: &str) -> Result<String, CapabilityError> {
    let model = self.model.as_ref().ok_or(CapabilityError::Unavailable)?;
    let session = model.create_session(self.options.clone()).await?;
    session.prompt(prompt).await
  }

  fn record(&self, entry: QueryHistoryEntry) {
    match self.history.lock() {
      Ok(mut history) => history.append(entry),
      Err(e) => warn!(error = %e, "query history lock poisoned"),
    }
  }

  /// Snapshot of the history, newest first
  pub fn history(&self) -> Vec<QueryHistoryEntry> {
    self.history.lock().map(|history| history.entries().to_vec()).unwrap_or_default()
  }

  pub fn clear_history(&self) {
    match self.history.lock() {
      Ok(mut history) => history.clear(),
      Err(e) => warn!(error = %e, "query history lock poisoned"),
    }
  }
}
