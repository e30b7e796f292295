//! Structured error types for the fix-distance engine.
//!
//! Core computations never fail for missing data; they return `None`.
//! These errors only surface at the edges: loading a catalog or snapshot,
//! compiling a release pattern, fetching an issue.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("invalid release pattern for project {project_id}: {source}")]
  Pattern {
    project_id: String,
    #[source]
    source: regex::Error,
  },

  #[error("not found: {what} {key}")]
  NotFound { what: String, key: String },

  #[error("parse: {0}")]
  Parse(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("toml: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn parse(msg: impl Into<String>) -> Self {
    Self::Parse(msg.into())
  }

  pub fn not_found(what: &str, key: &str) -> Self {
    Self::NotFound {
      what: what.to_string(),
      key: key.to_string(),
    }
  }
}
