//! [`LanguageModel`] backed by a local model server speaking the Ollama
//! REST API (`/api/tags`, `/api/pull`, `/api/generate`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::capability::{Availability, LanguageModel, ModelSession, SessionOptions};
use crate::config::ModelConfig;
use crate::error::CapabilityError;

#[derive(Debug, Deserialize)]
struct TagsResponse {
  #[serde(default)]
  models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
  name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
  model: &'a str,
  stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  stream: bool,
  options: GenerateOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct GenerateOptions {
  temperature: f32,
  top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  response: String,
}

pub struct HttpLanguageModel {
  client: Client,
  base_url: String,
  model: String,
  downloading: AtomicBool,
}

impl HttpLanguageModel {
  pub fn new(
    base_url: &str,
    model: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, CapabilityError> {
    let parsed = Url::parse(base_url)
      .map_err(|e| CapabilityError::session_failed(format!("invalid model URL '{base_url}': {e}")))?;
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| CapabilityError::session_failed(e.to_string()))?;

    Ok(Self {
      client,
      base_url: parsed.as_str().trim_end_matches('/').to_string(),
      model: model.into(),
      downloading: AtomicBool::new(false),
    })
  }

  pub fn from_config(config: &ModelConfig, timeout: Duration) -> Result<Self, CapabilityError> {
    Self::new(&config.base_url, config.name.clone(), timeout)
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/api/{}", self.base_url, path)
  }

  // A bare model name matches its ":latest" tag
  fn is_installed(&self, tags: &TagsResponse) -> bool {
    let latest = format!("{}:latest", self.model);
    tags.models.iter().any(|tag| tag.name == self.model || tag.name == latest)
  }

  async fn installed(&self) -> Result<bool, CapabilityError> {
    let response = self
      .client
      .get(self.endpoint("tags"))
      .send()
      .await
      .map_err(|e| CapabilityError::request_failed(e.to_string()))?;

    if !response.status().is_success() {
      return Err(CapabilityError::request_failed(format!(
        "model server responded with HTTP {}",
        response.status()
      )));
    }

    let tags: TagsResponse =
      response.json().await.map_err(|e| CapabilityError::invalid_response(e.to_string()))?;
    Ok(self.is_installed(&tags))
  }

  async fn pull(&self, options: &SessionOptions) -> Result<(), CapabilityError> {
    info!(model = %self.model, "downloading language model");
    self.downloading.store(true, Ordering::SeqCst);
    options.report_progress(0.0);

    let result = self
      .client
      .post(self.endpoint("pull"))
      .json(&PullRequest { model: &self.model, stream: false })
      .send()
      .await;
    self.downloading.store(false, Ordering::SeqCst);

    let response = result.map_err(|e| CapabilityError::session_failed(e.to_string()))?;
    if !response.status().is_success() {
      return Err(CapabilityError::session_failed(format!(
        "model download responded with HTTP {}",
        response.status()
      )));
    }

    options.report_progress(1.0);
    Ok(())
  }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
  async fn availability(&self) -> Result<Availability, CapabilityError> {
    if self.downloading.load(Ordering::SeqCst) {
      return Ok(Availability::Downloading);
    }

    if self.installed().await? {
      Ok(Availability::Available)
    } else {
      Ok(Availability::Downloadable)
    }
  }

  async fn create_session(
    &self,
    options: SessionOptions,
  ) -> Result<Box<dyn ModelSession>, CapabilityError> {
    if !self.installed().await? {
      self.pull(&options).await?;
    }

    debug!(model = %self.model, temperature = options.temperature, top_k = options.top_k, "session created");
    Ok(Box::new(HttpSession {
      client: self.client.clone(),
      url: self.endpoint("generate"),
      model: self.model.clone(),
      options: GenerateOptions { temperature: options.temperature, top_k: options.top_k },
    }))
  }
}

struct HttpSession {
  client: Client,
  url: String,
  model: String,
  options: GenerateOptions,
}

#[async_trait]
impl ModelSession for HttpSession {
  async fn prompt(&self, input: &str) -> Result<String, CapabilityError> {
    let request = GenerateRequest {
      model: &self.model,
      prompt: input,
      stream: false,
      options: self.options,
    };

    let response = self
      .client
      .post(&self.url)
      .json(&request)
      .send()
      .await
      .map_err(|e| CapabilityError::request_failed(e.to_string()))?;

    if !response.status().is_success() {
      return Err(CapabilityError::request_failed(format!(
        "model server responded with HTTP {}",
        response.status()
      )));
    }

    let body: GenerateResponse =
      response.json().await.map_err(|e| CapabilityError::invalid_response(e.to_string()))?;
    Ok(body.response)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::capability::ProgressMonitor;
  use mockito::{Matcher, Server};
  use std::sync::{Arc, Mutex};

  fn model_for(server: &Server, name: &str) -> HttpLanguageModel {
    HttpLanguageModel::new(&server.url(), name, Duration::from_secs(5)).unwrap()
  }

  #[tokio::test]
  async fn test_installed_model_is_available() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/api/tags")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"models":[{"name":"gemma3:latest"},{"name":"qwen3:4b"}]}"#)
      .create_async()
      .await;

    let model = model_for(&server, "gemma3");
    assert_eq!(model.availability().await.unwrap(), Availability::Available);
  }

  #[tokio::test]
  async fn test_missing_model_is_downloadable() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/api/tags")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"models":[]}"#)
      .create_async()
      .await;

    let model = model_for(&server, "gemma3:1b");
    assert_eq!(model.availability().await.unwrap(), Availability::Downloadable);
  }

  #[tokio::test]
  async fn test_server_error_is_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server.mock("GET", "/api/tags").with_status(500).create_async().await;

    let model = model_for(&server, "gemma3:1b");
    assert!(matches!(model.availability().await, Err(CapabilityError::RequestFailed { .. })));
  }

  #[test]
  fn test_invalid_base_url() {
    let result = HttpLanguageModel::new("not a url", "gemma3", Duration::from_secs(1));
    assert!(matches!(result, Err(CapabilityError::SessionFailed { .. })));
  }

  #[tokio::test]
  async fn test_session_sends_prompt_and_sampling_options() {
    let mut server = Server::new_async().await;
    let _tags = server
      .mock("GET", "/api/tags")
      .with_status(200)
      .with_body(r#"{"models":[{"name":"gemma3:1b"}]}"#)
      .create_async()
      .await;
    let generate = server
      .mock("POST", "/api/generate")
      .match_body(Matcher::PartialJsonString(
        r#"{"model":"gemma3:1b","prompt":"質問","stream":false,"options":{"top_k":3}}"#.to_string(),
      ))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"response":"- 条件: OR","done":true}"#)
      .create_async()
      .await;

    let model = model_for(&server, "gemma3:1b");
    let session = model.create_session(SessionOptions::default()).await.unwrap();
    let reply = session.prompt("質問").await.unwrap();

    assert_eq!(reply, "- 条件: OR");
    generate.assert_async().await;
  }

  #[tokio::test]
  async fn test_missing_model_is_pulled_with_progress() {
    let mut server = Server::new_async().await;
    let _tags = server
      .mock("GET", "/api/tags")
      .with_status(200)
      .with_body(r#"{"models":[]}"#)
      .create_async()
      .await;
    let pull = server
      .mock("POST", "/api/pull")
      .match_body(Matcher::PartialJsonString(r#"{"model":"gemma3:1b","stream":false}"#.to_string()))
      .with_status(200)
      .with_body(r#"{"status":"success"}"#)
      .expect(1)
      .create_async()
      .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let monitor: ProgressMonitor = Arc::new(move |fraction: f64| sink.lock().unwrap().push(fraction));
    let options = SessionOptions { monitor: Some(monitor), ..SessionOptions::default() };

    let model = model_for(&server, "gemma3:1b");
    assert!(model.create_session(options).await.is_ok());

    pull.assert_async().await;
    assert_eq!(*seen.lock().unwrap(), vec![0.0_f64, 1.0]);
  }

  #[tokio::test]
  async fn test_failed_generate_is_request_error() {
    let mut server = Server::new_async().await;
    let _tags = server
      .mock("GET", "/api/tags")
      .with_status(200)
      .with_body(r#"{"models":[{"name":"gemma3:1b"}]}"#)
      .create_async()
      .await;
    let _generate = server.mock("POST", "/api/generate").with_status(503).create_async().await;

    let model = model_for(&server, "gemma3:1b");
    let session = model.create_session(SessionOptions::default()).await.unwrap();
    assert!(matches!(session.prompt("x").await, Err(CapabilityError::RequestFailed { .. })));
  }
}
