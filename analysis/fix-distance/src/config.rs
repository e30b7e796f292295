//! Engine configuration: scanner tunables and the per-project catalog.
//!
//! Project configuration is loaded once per batch and passed explicitly into
//! every engine call; nothing here is process-wide state.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::TagClassifier;
use crate::error::EngineError;
use crate::types::{Release, Source};

/// Change-log field names and values the history scanners look for.
#[derive(Debug, Clone)]
pub struct Config {
  pub resolution_field: String,
  pub priority_field: String,
  pub status_field: String,
  /// Status value that counts as a reopen.
  pub reopened_status: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      resolution_field: "resolution".into(),
      priority_field: "priority".into(),
      status_field: "status".into(),
      reopened_status: "Reopened".into(),
    }
  }
}

fn default_accepted_resolutions() -> BTreeSet<String> {
  ["Done", "Implemented", "Fixed"]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Raw, serializable project configuration (one catalog entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
  pub project_id: String,
  #[serde(default)]
  pub project_key: Option<String>,
  /// Pattern a vcs tag name must match to count as a release.
  pub release_name_pattern: String,
  /// Pattern for tracker version names; every tracker version counts when unset.
  #[serde(default)]
  pub tracker_release_pattern: Option<String>,
  #[serde(default)]
  pub repositories: Vec<String>,
  #[serde(default = "default_accepted_resolutions")]
  pub accepted_resolution_values: BTreeSet<String>,
}

/// The set of projects analysed in one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
  #[serde(default)]
  pub projects: Vec<ProjectConfig>,
}

impl Catalog {
  pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
    Ok(toml::from_str(s)?)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
    let contents = std::fs::read_to_string(path)?;
    Self::from_toml_str(&contents)
  }

  /// Compile every project; the first invalid entry fails the whole load.
  pub fn compile(&self) -> Result<Vec<Project>, EngineError> {
    self.projects.iter().cloned().map(Project::compile).collect()
  }
}

/// A validated project with compiled classifiers. Immutable for a batch.
#[derive(Debug, Clone)]
pub struct Project {
  pub config: ProjectConfig,
  vcs_classifier: TagClassifier,
  tracker_classifier: Option<TagClassifier>,
}

impl Project {
  pub fn compile(config: ProjectConfig) -> Result<Self, EngineError> {
    if config.project_id.trim().is_empty() {
      return Err(EngineError::validation("project_id", "must not be empty"));
    }
    let vcs_classifier = TagClassifier::new(&config.project_id, &config.release_name_pattern)?;
    let tracker_classifier = match &config.tracker_release_pattern {
      Some(p) => Some(TagClassifier::new(&config.project_id, p)?),
      None => None,
    };
    Ok(Self {
      config,
      vcs_classifier,
      tracker_classifier,
    })
  }

  pub fn id(&self) -> &str {
    &self.config.project_id
  }

  /// Whether `name` is a release name for the given source.
  pub fn classifies_name(&self, source: Source, name: &str) -> bool {
    match source {
      Source::Vcs => self.vcs_classifier.is_release(name),
      Source::Tracker => self
        .tracker_classifier
        .as_ref()
        .map_or(true, |c| c.is_release(name)),
    }
  }

  /// Whether a release belongs to this project and passes classification.
  pub fn classifies(&self, release: &Release) -> bool {
    release.project_id == self.config.project_id && self.classifies_name(release.source, &release.name)
  }

  pub fn accepts_resolution(&self, value: &str) -> bool {
    self.config.accepted_resolution_values.contains(value)
  }
}
