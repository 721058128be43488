//! Query history cache.
//!
//! Every natural-language query, successful or not, is recorded here for
//! display and debugging. The list is newest first and never holds more
//! than [`HISTORY_CAPACITY`] entries. It is mirrored to a key-value store
//! on every append and read back at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::filter::FilterFragment;

pub const HISTORY_CAPACITY: usize = 20;
pub const HISTORY_KEY: &str = "query_history";

static ENTRY_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHistoryEntry {
  pub id: String,
  pub timestamp: DateTime<Utc>,
  pub query: String,
  /// Instruction text exactly as sent to the model
  pub prompt: String,
  /// Raw model output, empty when the call failed
  pub response: String,
  pub parsed_filters: FilterFragment,
  pub duration_ms: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl QueryHistoryEntry {
  pub fn new(
    query: impl Into<String>,
    prompt: impl Into<String>,
    response: impl Into<String>,
    parsed_filters: FilterFragment,
    duration_ms: u64,
  ) -> Self {
    let timestamp = Utc::now();
    Self {
      id: next_entry_id(timestamp),
      timestamp,
      query: query.into(),
      prompt: prompt.into(),
      response: response.into(),
      parsed_filters,
      duration_ms,
      error: None,
    }
  }

  pub fn failed(
    query: impl Into<String>,
    prompt: impl Into<String>,
    error: impl Into<String>,
    duration_ms: u64,
  ) -> Self {
    let mut entry = Self::new(query, prompt, "", FilterFragment::default(), duration_ms);
    entry.error = Some(error.into());
    entry
  }

  pub fn with_error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }
}

// Millisecond timestamp plus a process-wide counter, so two entries created
// in the same millisecond still get distinct ids.
fn next_entry_id(timestamp: DateTime<Utc>) -> String {
  let sequence = ENTRY_COUNTER.fetch_add(1, Ordering::Relaxed);
  format!("{}-{}", timestamp.timestamp_millis(), sequence)
}

/// Durable string storage addressed by key
pub trait KeyValueStore: Send {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
  fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One JSON file per key under a root directory
pub struct FileStore {
  root: PathBuf,
}

impl FileStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.root.join(format!("{key}.json"))
  }
}

impl KeyValueStore for FileStore {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    let path = self.path_for(key);
    if !path.exists() {
      return Ok(None);
    }
    fs::read_to_string(&path).map(Some).map_err(|e| StorageError::io(key, e.to_string()))
  }

  fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
    fs::create_dir_all(&self.root).map_err(|e| StorageError::io(key, e.to_string()))?;
    fs::write(self.path_for(key), value).map_err(|e| StorageError::io(key, e.to_string()))
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let path = self.path_for(key);
    if path.exists() {
      fs::remove_file(&path).map_err(|e| StorageError::io(key, e.to_string()))?;
    }
    Ok(())
  }
}

#[derive(Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_value(key: &str, value: &str) -> Self {
    let store = Self::new();
    if let Ok(mut values) = store.values.lock() {
      values.insert(key.to_string(), value.to_string());
    }
    store
  }
}

impl KeyValueStore for MemoryStore {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    let values = self.values.lock().map_err(|e| StorageError::io(key, e.to_string()))?;
    Ok(values.get(key).cloned())
  }

  fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let mut values = self.values.lock().map_err(|e| StorageError::io(key, e.to_string()))?;
    values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let mut values = self.values.lock().map_err(|e| StorageError::io(key, e.to_string()))?;
    values.remove(key);
    Ok(())
  }
}

pub struct QueryHistory {
  entries: Vec<QueryHistoryEntry>,
  store: Box<dyn KeyValueStore>,
}

impl QueryHistory {
  /// Rehydrate from storage. Missing or corrupt data starts an empty history.
  pub fn load(store: Box<dyn KeyValueStore>) -> Self {
    let entries = match store.read(HISTORY_KEY) {
      Ok(Some(raw)) => match serde_json::from_str::<Vec<QueryHistoryEntry>>(&raw) {
        Ok(mut entries) => {
          entries.truncate(HISTORY_CAPACITY);
          entries
        }
        Err(e) => {
          warn!(error = %e, "discarding unreadable query history");
          Vec::new()
        }
      },
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(error = %e, "could not read query history");
        Vec::new()
      }
    };

    debug!(count = entries.len(), "query history loaded");
    Self { entries, store }
  }

  pub fn in_memory() -> Self {
    Self::load(Box::new(MemoryStore::new()))
  }

  /// Newest entry first
  pub fn entries(&self) -> &[QueryHistoryEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Prepend, evict beyond capacity, then persist
  pub fn append(&mut self, entry: QueryHistoryEntry) {
    self.entries.insert(0, entry);
    self.entries.truncate(HISTORY_CAPACITY);
    self.persist();
  }

  pub fn clear(&mut self) {
    self.entries.clear();
    if let Err(e) = self.store.remove(HISTORY_KEY) {
      warn!(error = %e, "failed to clear stored query history");
    }
  }

  fn persist(&self) {
    let serialized = match serde_json::to_string(&self.entries) {
      Ok(serialized) => serialized,
      Err(e) => {
        warn!(error = %e, "failed to serialize query history");
        return;
      }
    };

    if let Err(e) = self.store.write(HISTORY_KEY, &serialized) {
      warn!(error = %e, "failed to persist query history");
    }
  }
}
