use thiserror::Error;

/// Failure to read one of the closed enumerations from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  #[error("Unknown tool name '{value}'")]
  UnknownTool { value: String },

  #[error("Unknown adoption status '{value}'")]
  UnknownStatus { value: String },

  #[error("Unknown filter operator '{value}' (expected AND or OR)")]
  UnknownOperator { value: String },

  #[error("Unknown sort field '{value}'")]
  UnknownSortField { value: String },
}

impl ParseError {
  pub fn unknown_tool(value: impl Into<String>) -> Self {
    Self::UnknownTool { value: value.into() }
  }

  pub fn unknown_status(value: impl Into<String>) -> Self {
    Self::UnknownStatus { value: value.into() }
  }

  pub fn unknown_operator(value: impl Into<String>) -> Self {
    Self::UnknownOperator { value: value.into() }
  }

  pub fn unknown_sort_field(value: impl Into<String>) -> Self {
    Self::UnknownSortField { value: value.into() }
  }
}

#[derive(Error, Debug)]
pub enum DatasetError {
  #[error("Failed to fetch data from {url}: {message}")]
  FetchFailed { url: String, message: String },

  #[error("Data source {url} responded with HTTP {status}")]
  BadStatus { url: String, status: u16 },

  #[error("Failed to read data file {path}: {message}")]
  ReadFailed { path: String, message: String },

  #[error("Failed to parse company data: {message}")]
  ParseFailed { message: String },
}

impl DatasetError {
  pub fn fetch_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
    Self::FetchFailed { url: url.into(), message: message.into() }
  }

  pub fn bad_status(url: impl Into<String>, status: u16) -> Self {
    Self::BadStatus { url: url.into(), status }
  }

  pub fn read_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self::ReadFailed { path: path.into(), message: message.into() }
  }

  pub fn parse_failed(message: impl Into<String>) -> Self {
    Self::ParseFailed { message: message.into() }
  }
}

/// Errors raised by a text-completion capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
  #[error("Language model is not available")]
  Unavailable,

  #[error("Failed to create language model session: {message}")]
  SessionFailed { message: String },

  #[error("Language model request failed: {message}")]
  RequestFailed { message: String },

  #[error("Language model returned an unexpected response: {message}")]
  InvalidResponse { message: String },
}

impl CapabilityError {
  pub fn session_failed(message: impl Into<String>) -> Self {
    Self::SessionFailed { message: message.into() }
  }

  pub fn request_failed(message: impl Into<String>) -> Self {
    Self::RequestFailed { message: message.into() }
  }

  pub fn invalid_response(message: impl Into<String>) -> Self {
    Self::InvalidResponse { message: message.into() }
  }
}

#[derive(Error, Debug)]
pub enum StorageError {
  #[error("Could not determine a storage directory")]
  NoStorageDir,

  #[error("Storage operation on '{key}' failed: {message}")]
  Io { key: String, message: String },
}

impl StorageError {
  pub fn io(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Io { key: key.into(), message: message.into() }
  }
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Could not determine configuration directory")]
  NoConfigDir,

  #[error("Failed to read config {path}: {message}")]
  ReadFailed { path: String, message: String },

  #[error("Invalid config {path}: {message}")]
  Invalid { path: String, message: String },

  #[error("Invalid value for {name}: '{value}'")]
  InvalidEnv { name: String, value: String },
}

impl ConfigError {
  pub fn read_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self::ReadFailed { path: path.into(), message: message.into() }
  }

  pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Invalid { path: path.into(), message: message.into() }
  }

  pub fn invalid_env(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self::InvalidEnv { name: name.into(), value: value.into() }
  }
}

#[derive(Error, Debug)]
pub enum SortError {
  #[error("Japanese collation data is unavailable: {message}")]
  CollatorUnavailable { message: String },
}

impl SortError {
  pub fn collator_unavailable(message: impl Into<String>) -> Self {
    Self::CollatorUnavailable { message: message.into() }
  }
}
