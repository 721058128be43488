//! One-shot loading of the company dataset.
//!
//! The dataset is a JSON array of companies, fetched once at start either
//! from a remote URL or from a local file. Any failure is fatal to the view;
//! nothing is retried and nothing is partially rendered.

use reqwest::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::DatasetError;
use crate::model::Company;

pub const DEFAULT_DATA_URL: &str =
  "https://raw.githubusercontent.com/fumiya-kume/ai-in-japan/refs/heads/master/data.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
  Remote(Url),
  Local(PathBuf),
}

impl DataSource {
  /// http(s) URLs are fetched; `file://` URLs and anything else are file paths
  pub fn parse(location: &str) -> Self {
    match Url::parse(location) {
      Ok(url) if matches!(url.scheme(), "http" | "https") => DataSource::Remote(url),
      Ok(url) if url.scheme() == "file" => match url.to_file_path() {
        Ok(path) => DataSource::Local(path),
        Err(()) => DataSource::Local(PathBuf::from(location)),
      },
      _ => DataSource::Local(PathBuf::from(location)),
    }
  }

  pub fn describe(&self) -> String {
    match self {
      DataSource::Remote(url) => url.to_string(),
      DataSource::Local(path) => path.display().to_string(),
    }
  }
}

pub async fn load_companies(
  source: &DataSource,
  timeout: Duration,
) -> Result<Vec<Company>, DatasetError> {
  debug!(source = %source.describe(), "loading company dataset");

  let result = match source {
    DataSource::Remote(url) => {
      let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DatasetError::fetch_failed(url.as_str(), e.to_string()))?;
      fetch_companies(&client, url).await
    }
    DataSource::Local(path) => read_companies(path),
  };

  if let Err(e) = &result {
    warn!(source = %source.describe(), error = %e, "failed to load company dataset");
  }
  result
}

pub async fn fetch_companies(client: &Client, url: &Url) -> Result<Vec<Company>, DatasetError> {
  let response = client
    .get(url.clone())
    .send()
    .await
    .map_err(|e| DatasetError::fetch_failed(url.as_str(), e.to_string()))?;

  if !response.status().is_success() {
    return Err(DatasetError::bad_status(url.as_str(), response.status().as_u16()));
  }

  let body = response
    .text()
    .await
    .map_err(|e| DatasetError::fetch_failed(url.as_str(), e.to_string()))?;
  parse_companies(&body)
}

pub fn read_companies(path: &Path) -> Result<Vec<Company>, DatasetError> {
  let content = fs::read_to_string(path)
    .map_err(|e| DatasetError::read_failed(path.display().to_string(), e.to_string()))?;
  parse_companies(&content)
}

pub fn parse_companies(json: &str) -> Result<Vec<Company>, DatasetError> {
  serde_json::from_str(json).map_err(|e| DatasetError::parse_failed(e.to_string()))
}
