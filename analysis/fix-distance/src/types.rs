//! Core types for the fix-distance engine (snapshot contracts + output record).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Sources and units
// ---------------------------------------------------------------------------

/// Where a release comes from: the issue tracker's version list or the
/// version-control tag list. Ranks from different sources are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  Tracker,
  Vcs,
}

impl Source {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Tracker => "tracker",
      Self::Vcs => "vcs",
    }
  }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
  Days,
  Releases,
}

impl FromStr for DistanceUnit {
  type Err = EngineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "days" => Ok(Self::Days),
      "releases" => Ok(Self::Releases),
      other => Err(EngineError::parse(format!(
        "unknown distance unit {:?} (expected days|releases)",
        other
      ))),
    }
  }
}

// ---------------------------------------------------------------------------
// Snapshot entities (read-only once ingested)
// ---------------------------------------------------------------------------

/// A named, dated point in either the tracker's version list or the tag list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
  pub project_id: String,
  pub source: Source,
  pub name: String,
  #[serde(default)]
  pub date: Option<DateTime<Utc>>,
  /// Only set for vcs releases.
  #[serde(default)]
  pub repository: Option<String>,
}

impl Release {
  /// Identity key: unique per (project, source, name, repository).
  pub fn identity(&self) -> (&str, Source, &str, Option<&str>) {
    (
      self.project_id.as_str(),
      self.source,
      self.name.as_str(),
      self.repository.as_deref(),
    )
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
  #[serde(default)]
  pub insertions: u64,
  #[serde(default)]
  pub deletions: u64,
  #[serde(default)]
  pub files: u64,
}

impl CommitStats {
  pub fn lines(&self) -> u64 {
    self.insertions + self.deletions
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
  pub project_id: String,
  pub repository: String,
  pub sha: String,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub committer: Option<String>,
  #[serde(default)]
  pub date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub stats: CommitStats,
}

/// One field mutation in an issue's change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub timestamp: DateTime<Utc>,
  #[serde(default)]
  pub author: Option<String>,
  pub field: String,
  #[serde(default)]
  pub from_value: Option<String>,
  #[serde(default)]
  pub to_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
  pub project_id: String,
  pub key: String,
  #[serde(default)]
  pub created_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub priority: Option<String>,
  #[serde(default)]
  pub resolution: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub affected_versions: Vec<Release>,
  #[serde(default)]
  pub fix_versions: Vec<Release>,
  #[serde(default)]
  pub linked_commits: Vec<Commit>,
  #[serde(default)]
  pub change_log: Vec<ChangeEvent>,
  #[serde(default)]
  pub comments_count: u32,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

/// Day and release distances from one source, or reconciled across both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Distances {
  pub days: Option<i64>,
  pub releases: Option<i64>,
}

/// One flat row per issue. Every field that could not be computed is null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
  pub record_id: String,
  pub project_id: String,
  pub issue_key: String,
  pub priority: Option<String>,
  pub resolution: Option<String>,
  pub status: Option<String>,
  pub created_date: Option<DateTime<Utc>>,
  pub comments_count: u32,

  pub earliest_affected_release: Option<String>,
  pub latest_affected_release: Option<String>,
  pub earliest_fix_release: Option<String>,
  pub latest_fix_release: Option<String>,
  pub closest_tracker_release: Option<String>,
  pub closest_vcs_release: Option<String>,
  pub tracker_start_release: Option<String>,
  pub vcs_start_release: Option<String>,
  pub earliest_vcs_release: Option<String>,

  pub tracker_distance_days: Option<i64>,
  pub tracker_distance_releases: Option<i64>,
  pub vcs_distance_days: Option<i64>,
  pub vcs_distance_releases: Option<i64>,
  pub fix_distance_days: Option<i64>,
  pub fix_distance_releases: Option<i64>,

  pub resolver: Option<String>,
  pub resolution_date: Option<DateTime<Utc>>,
  pub resolution_hours: Option<f64>,
  pub reopen_count: u32,
  pub priority_changer: Option<String>,
  pub priority_changed_from: Option<String>,
  pub priority_changed_to: Option<String>,
  pub priority_change_date: Option<DateTime<Utc>>,
  pub priority_change_count: u32,

  pub commit_count: u32,
  pub tagged_commit_count: u32,
  pub committer: Option<String>,
  pub commit_repository: Option<String>,
  pub commit_date: Option<DateTime<Utc>>,
  pub commit_resolution_hours: Option<f64>,
  pub avg_lines: Option<f64>,
  pub total_insertions: Option<u64>,
  pub total_deletions: Option<u64>,
  pub avg_files: Option<f64>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for issues that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub project_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub issue_key: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      project_id: None,
      issue_key: None,
    }
  }

  pub fn with_issue(mut self, project_id: impl Into<String>, issue_key: impl Into<String>) -> Self {
    self.project_id = Some(project_id.into());
    self.issue_key = Some(issue_key.into());
    self
  }
}
