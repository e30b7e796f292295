//! Release-name classification against a per-project pattern.
//!
//! A name that fails classification is noise: it never participates in
//! ranking, tag resolution or distance computation.

use regex::Regex;

use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct TagClassifier {
  pattern: Regex,
}

impl TagClassifier {
  /// Compile a classifier. Patterns are matched as written, so anchor them
  /// (`^...$`) to reject names that merely contain a version.
  pub fn new(project_id: &str, pattern: &str) -> Result<Self, EngineError> {
    let pattern = Regex::new(pattern).map_err(|source| EngineError::Pattern {
      project_id: project_id.to_string(),
      source,
    })?;
    Ok(Self { pattern })
  }

  pub fn is_release(&self, name: &str) -> bool {
    self.pattern.is_match(name)
  }

  pub fn pattern(&self) -> &str {
    self.pattern.as_str()
  }
}
