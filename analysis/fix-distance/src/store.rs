//! Read-only collaborator interfaces and an in-memory snapshot implementation.
//!
//! Ingestion (remote APIs, local vcs clients, relational stores) lives
//! outside this crate; the engine only ever reads through these traits.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProjectConfig;
use crate::error::EngineError;
use crate::types::{Commit, Issue, Release, Source};

pub trait ReleaseStore {
  fn releases_for_project(&self, project_id: &str, source: Source) -> Vec<Release>;
  fn release_by_name(&self, project_id: &str, source: Source, name: &str) -> Option<Release>;
}

/// Pre-linked "tag contains commit" relationship, before classification.
pub trait CommitTagStore {
  fn tags_for_commit(&self, project_id: &str, repository: &str, commit_sha: &str) -> Vec<Release>;
}

pub trait IssueStore {
  /// Issue keys of a project, in a stable order.
  fn issue_keys(&self, project_id: &str) -> Vec<String>;
  fn issue(&self, key: &str) -> Result<Issue, EngineError>;

  /// Issue rows dropped at ingestion, in input order.
  fn rejected_issues(&self) -> Vec<RejectedIssue> {
    Vec::new()
  }
}

/// An issue row that could not be indexed. The rest of the snapshot still is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedIssue {
  pub project_id: String,
  pub issue_key: String,
  pub reason: String,
}

pub trait CommitStore {
  fn commits_for_issue(&self, project_id: &str, key: &str) -> Vec<Commit>;
}

/// Everything the aggregator reads from.
pub trait Store: ReleaseStore + CommitTagStore + IssueStore + CommitStore {}

impl<T: ReleaseStore + CommitTagStore + IssueStore + CommitStore> Store for T {}

// ---------------------------------------------------------------------------
// Snapshot (JSON contract)
// ---------------------------------------------------------------------------

/// One row of the tag/commit containment relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTag {
  pub project_id: String,
  pub repository: String,
  pub commit_sha: String,
  pub tag_name: String,
}

/// Materialized ingestion output. Unknown fields are silently ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
  #[serde(default)]
  pub projects: Vec<ProjectConfig>,
  #[serde(default)]
  pub releases: Vec<Release>,
  #[serde(default)]
  pub commit_tags: Vec<CommitTag>,
  #[serde(default)]
  pub issues: Vec<Issue>,
}

impl Snapshot {
  pub fn from_json(s: &str) -> Result<Self, EngineError> {
    Ok(serde_json::from_str(s)?)
  }
}

type TagKey = (String, String, String);

/// Indexed, validated view over a [`Snapshot`].
#[derive(Debug, Default)]
pub struct MemoryStore {
  releases: HashMap<(String, Source), Vec<Release>>,
  tags: HashMap<TagKey, Vec<String>>,
  issues: BTreeMap<String, Issue>,
  rejected: Vec<RejectedIssue>,
}

impl MemoryStore {
  pub fn new(snapshot: Snapshot) -> Result<Self, EngineError> {
    let mut store = Self::default();

    let mut seen = HashSet::new();
    for release in snapshot.releases {
      if release.project_id.is_empty() {
        return Err(EngineError::validation("releases[].project_id", "must not be empty"));
      }
      let identity = (
        release.project_id.clone(),
        release.source,
        release.name.clone(),
        release.repository.clone(),
      );
      if !seen.insert(identity) {
        return Err(EngineError::validation(
          "releases[]",
          &format!(
            "duplicate {} release {:?} in project {}",
            release.source, release.name, release.project_id
          ),
        ));
      }
      store
        .releases
        .entry((release.project_id.clone(), release.source))
        .or_default()
        .push(release);
    }

    for link in snapshot.commit_tags {
      store
        .tags
        .entry((link.project_id, link.repository, link.commit_sha))
        .or_default()
        .push(link.tag_name);
    }

    for issue in snapshot.issues {
      if let Err(e) = store.check_issue(&issue) {
        let reason = e.to_string();
        warn!(project_id = %issue.project_id, issue_key = %issue.key, %reason, "issue row rejected");
        store.rejected.push(RejectedIssue {
          project_id: issue.project_id,
          issue_key: issue.key,
          reason,
        });
        continue;
      }
      store.issues.insert(issue.key.clone(), issue);
    }

    debug!(
      releases = store.releases.values().map(Vec::len).sum::<usize>(),
      tagged_commits = store.tags.len(),
      issues = store.issues.len(),
      rejected_issues = store.rejected.len(),
      "snapshot indexed"
    );
    Ok(store)
  }

  /// The first row for a key wins; later duplicates are rejected.
  fn check_issue(&self, issue: &Issue) -> Result<(), EngineError> {
    if issue.key.is_empty() {
      return Err(EngineError::validation("issues[].key", "must not be empty"));
    }
    if issue.project_id.is_empty() {
      return Err(EngineError::validation("issues[].project_id", "must not be empty"));
    }
    if self.issues.contains_key(&issue.key) {
      return Err(EngineError::validation(
        "issues[].key",
        &format!("duplicate issue {}", issue.key),
      ));
    }
    Ok(())
  }

  fn find_vcs_release(&self, project_id: &str, repository: &str, name: &str) -> Option<&Release> {
    self
      .releases
      .get(&(project_id.to_string(), Source::Vcs))?
      .iter()
      .find(|r| r.name == name && r.repository.as_deref() == Some(repository))
  }
}

impl ReleaseStore for MemoryStore {
  fn releases_for_project(&self, project_id: &str, source: Source) -> Vec<Release> {
    self
      .releases
      .get(&(project_id.to_string(), source))
      .cloned()
      .unwrap_or_default()
  }

  /// With several repositories sharing a tag name, the earliest-dated one wins.
  fn release_by_name(&self, project_id: &str, source: Source, name: &str) -> Option<Release> {
    self
      .releases
      .get(&(project_id.to_string(), source))?
      .iter()
      .filter(|r| r.name == name)
      .min_by(|a, b| {
        (a.date.is_none(), a.date, &a.repository).cmp(&(b.date.is_none(), b.date, &b.repository))
      })
      .cloned()
  }
}

impl CommitTagStore for MemoryStore {
  /// Tags without a matching release row come back undated.
  fn tags_for_commit(&self, project_id: &str, repository: &str, commit_sha: &str) -> Vec<Release> {
    let key = (
      project_id.to_string(),
      repository.to_string(),
      commit_sha.to_string(),
    );
    let Some(names) = self.tags.get(&key) else {
      return Vec::new();
    };
    names
      .iter()
      .map(|name| {
        self
          .find_vcs_release(project_id, repository, name)
          .cloned()
          .unwrap_or_else(|| Release {
            project_id: project_id.to_string(),
            source: Source::Vcs,
            name: name.clone(),
            date: None,
            repository: Some(repository.to_string()),
          })
      })
      .collect()
  }
}

impl IssueStore for MemoryStore {
  fn issue_keys(&self, project_id: &str) -> Vec<String> {
    self
      .issues
      .values()
      .filter(|i| i.project_id == project_id)
      .map(|i| i.key.clone())
      .collect()
  }

  fn issue(&self, key: &str) -> Result<Issue, EngineError> {
    self
      .issues
      .get(key)
      .cloned()
      .ok_or_else(|| EngineError::not_found("issue", key))
  }

  fn rejected_issues(&self) -> Vec<RejectedIssue> {
    self.rejected.clone()
  }
}

impl CommitStore for MemoryStore {
  fn commits_for_issue(&self, project_id: &str, key: &str) -> Vec<Commit> {
    self
      .issues
      .get(key)
      .filter(|i| i.project_id == project_id)
      .map(|i| i.linked_commits.clone())
      .unwrap_or_default()
  }
}
