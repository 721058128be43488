//! The text-completion capability consumed by natural-language search.
//!
//! The capability is optional. When it is absent, or reports anything other
//! than [`Availability::Available`], natural-language search is hidden and the
//! rest of the dashboard keeps working.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::CapabilityError;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TOP_K: u32 = 3;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub const SETUP_GUIDE_URL: &str = "https://ollama.com/download";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
  Unavailable,
  Downloadable,
  Downloading,
  Available,
}

impl Availability {
  pub fn is_available(&self) -> bool {
    *self == Availability::Available
  }

  pub fn label(&self) -> &'static str {
    match self {
      Availability::Available => "利用可能",
      Availability::Downloading => "ダウンロード中",
      Availability::Downloadable => "ダウンロード可能",
      Availability::Unavailable => "利用不可",
    }
  }

  pub fn icon(&self) -> &'static str {
    match self {
      Availability::Available => "✅",
      Availability::Downloading => "⏳",
      Availability::Downloadable => "📥",
      Availability::Unavailable => "❌",
    }
  }

  /// User-facing guidance for every state except `Available`
  pub fn guidance(&self) -> Option<&'static str> {
    match self {
      Availability::Downloadable => Some("言語モデルをダウンロード可能です。"),
      Availability::Downloading => Some("言語モデルをダウンロード中..."),
      Availability::Unavailable => Some("言語モデルはこの環境でサポートされていません。"),
      Availability::Available => None,
    }
  }
}

impl fmt::Display for Availability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Availability::Unavailable => "unavailable",
      Availability::Downloadable => "downloadable",
      Availability::Downloading => "downloading",
      Availability::Available => "available",
    };
    f.write_str(name)
  }
}

/// Receives download progress as a fraction between 0.0 and 1.0
pub type ProgressMonitor = Arc<dyn Fn(f64) + Send + Sync>;

#[derive(Clone)]
pub struct SessionOptions {
  pub temperature: f32,
  pub top_k: u32,
  pub monitor: Option<ProgressMonitor>,
}

impl Default for SessionOptions {
  fn default() -> Self {
    Self { temperature: DEFAULT_TEMPERATURE, top_k: DEFAULT_TOP_K, monitor: None }
  }
}

impl fmt::Debug for SessionOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SessionOptions")
      .field("temperature", &self.temperature)
      .field("top_k", &self.top_k)
      .field("monitor", &self.monitor.is_some())
      .finish()
  }
}

impl SessionOptions {
  pub fn report_progress(&self, fraction: f64) {
    if let Some(monitor) = &self.monitor {
      monitor(fraction.clamp(0.0, 1.0));
    }
  }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
  async fn availability(&self) -> Result<Availability, CapabilityError>;

  async fn create_session(
    &self,
    options: SessionOptions,
  ) -> Result<Box<dyn ModelSession>, CapabilityError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelSession: Send + Sync {
  async fn prompt(&self, input: &str) -> Result<String, CapabilityError>;
}

/// Probe a possibly-absent capability. Absence and probe errors both read
/// as `Unavailable`.
pub async fn probe(model: Option<&dyn LanguageModel>) -> Availability {
  let Some(model) = model else {
    return Availability::Unavailable;
  };

  match model.availability().await {
    Ok(status) => status,
    Err(e) => {
      warn!(error = %e, "error checking model availability");
      Availability::Unavailable
    }
  }
}

/// Polls a capability at a fixed interval and publishes the latest state
pub struct AvailabilityMonitor {
  receiver: watch::Receiver<Availability>,
  handle: JoinHandle<()>,
}

impl AvailabilityMonitor {
  pub fn spawn(model: Arc<dyn LanguageModel>, interval: Duration) -> Self {
    let (sender, receiver) = watch::channel(Availability::Unavailable);

    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      loop {
        ticker.tick().await;
        let status = probe(Some(model.as_ref())).await;
        debug!(%status, "model availability polled");
        sender.send_if_modified(|current| {
          let changed = *current != status;
          *current = status;
          changed
        });
        if sender.is_closed() {
          break;
        }
      }
    });

    Self { receiver, handle }
  }

  pub fn current(&self) -> Availability {
    *self.receiver.borrow()
  }

  pub fn subscribe(&self) -> watch::Receiver<Availability> {
    self.receiver.clone()
  }
}

impl Drop for AvailabilityMonitor {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  #[tokio::test]
  async fn test_probe_without_capability() {
    assert_eq!(probe(None).await, Availability::Unavailable);
  }

  #[tokio::test]
  async fn test_probe_error_reads_as_unavailable() {
    let mut model = MockLanguageModel::new();
    model
      .expect_availability()
      .times(1)
      .returning(|| Err(CapabilityError::request_failed("connection refused")));

    assert_eq!(probe(Some(&model as &dyn LanguageModel)).await, Availability::Unavailable);
  }

  #[tokio::test]
  async fn test_probe_passes_status_through() {
    let mut model = MockLanguageModel::new();
    model.expect_availability().returning(|| Ok(Availability::Downloadable));

    assert_eq!(probe(Some(&model as &dyn LanguageModel)).await, Availability::Downloadable);
  }

  #[tokio::test]
  async fn test_monitor_publishes_polled_state() {
    let mut model = MockLanguageModel::new();
    model.expect_availability().returning(|| Ok(Availability::Available));

    let monitor = AvailabilityMonitor::spawn(Arc::new(model), Duration::from_millis(10));
    let mut updates = monitor.subscribe();

    tokio::time::timeout(Duration::from_secs(2), updates.changed()).await.unwrap().unwrap();
    assert_eq!(monitor.current(), Availability::Available);
  }

  #[test]
  fn test_guidance_for_each_state() {
    assert!(Availability::Available.guidance().is_none());
    for status in
      [Availability::Unavailable, Availability::Downloadable, Availability::Downloading]
    {
      assert!(status.guidance().is_some());
      assert!(!status.is_available());
    }
  }

  #[test]
  fn test_availability_serde_names() {
    let status: Availability = serde_json::from_str("\"downloading\"").unwrap();
    assert_eq!(status, Availability::Downloading);
    assert_eq!(status.to_string(), "downloading");
  }

  #[test]
  fn test_progress_is_clamped() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let monitor: ProgressMonitor = Arc::new(move |fraction: f64| sink.lock().unwrap().push(fraction));
    let options = SessionOptions { monitor: Some(monitor), ..SessionOptions::default() };

    options.report_progress(0.5);
    options.report_progress(1.7);
    assert_eq!(*seen.lock().unwrap(), vec![0.5_f64, 1.0]);
  }
}
