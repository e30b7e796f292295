//! Per-issue metrics: assembles tracker- and vcs-derived findings into one
//! flat record.
//!
//! Every sub-computation is best-effort. A missing release, tag or log entry
//! turns the matching fields null; the record is always produced.

use chrono::{DateTime, Utc};

use crate::config::{Config, Project};
use crate::distance::{distances, reconcile_distances};
use crate::earliest::{earliest, first_last};
use crate::history;
use crate::resolve::tags_per_commit;
use crate::sequence::VersionSequencer;
use crate::store::Store;
use crate::types::{Commit, Issue, MetricsRecord, Release, Source};

/// Project-wide, read-only inputs: loaded once per batch and shared by every
/// issue of the project.
pub struct ProjectContext<'a, S: ?Sized> {
  store: &'a S,
  project: &'a Project,
  config: &'a Config,
  tracker: VersionSequencer,
  vcs: VersionSequencer,
}

impl<'a, S: Store + ?Sized> ProjectContext<'a, S> {
  pub fn load(store: &'a S, project: &'a Project, config: &'a Config) -> Self {
    Self {
      store,
      project,
      config,
      tracker: VersionSequencer::load(store, project, Source::Tracker),
      vcs: VersionSequencer::load(store, project, Source::Vcs),
    }
  }

  pub fn project(&self) -> &Project {
    self.project
  }

  pub fn tracker(&self) -> &VersionSequencer {
    &self.tracker
  }

  pub fn vcs(&self) -> &VersionSequencer {
    &self.vcs
  }

  /// Fill in a missing date from the release store; drop unclassified names.
  fn tracker_versions(&self, versions: &[Release]) -> Vec<Release> {
    versions
      .iter()
      .map(|v| match v.date {
        Some(_) => v.clone(),
        None => self
          .store
          .release_by_name(self.project.id(), v.source, &v.name)
          .unwrap_or_else(|| v.clone()),
      })
      .filter(|v| self.project.classifies(v))
      .collect()
  }

  /// The vcs tag carrying the tracker start release's name, if classified.
  fn vcs_counterpart(&self, tracker_start: Option<&Release>) -> Option<Release> {
    let name = &tracker_start?.name;
    self
      .store
      .release_by_name(self.project.id(), Source::Vcs, name)
      .filter(|r| r.date.is_some() && self.project.classifies(r))
  }

  /// Commits carried on the issue; the commit store only when it carries none.
  fn commits(&self, issue: &Issue) -> Vec<Commit> {
    if issue.linked_commits.is_empty() {
      self.store.commits_for_issue(self.project.id(), &issue.key)
    } else {
      issue.linked_commits.clone()
    }
  }

  pub fn compute(&self, issue: &Issue) -> MetricsRecord {
    let project_id = self.project.id();

    // Tracker side.
    let affected = self.tracker_versions(&issue.affected_versions);
    let fixes = self.tracker_versions(&issue.fix_versions);
    let (earliest_affected, latest_affected) = first_last(&affected);
    let (earliest_fix, latest_fix) = first_last(&fixes);

    let closest_tracker = self.tracker.closest_after(issue.created_date);
    let tracker_start = earliest_affected
      .filter(|r| r.date.is_some())
      .or(closest_tracker);
    let tracker_distance = distances(&self.tracker, tracker_start, earliest_fix);

    // Vcs side.
    let commits = self.commits(issue);
    let tag_sets = tags_per_commit(self.store, self.project, &commits);
    let earliest_vcs = earliest(&tag_sets);
    let closest_vcs = self.vcs.closest_after(issue.created_date);
    let vcs_start = self
      .vcs_counterpart(tracker_start)
      .or_else(|| closest_vcs.cloned());
    let vcs_distance = distances(&self.vcs, vcs_start.as_ref(), earliest_vcs.as_ref());

    let fix_distance = reconcile_distances(tracker_distance, vcs_distance);

    // Change log.
    let resolution = history::resolution_event(&issue.change_log, self.project, self.config);
    let priority = history::priority_event(&issue.change_log, self.config);
    let resolution_date = resolution.map(|e| e.timestamp);

    let commit_summary = CommitSummary::from_commits(&commits, issue.created_date);

    MetricsRecord {
      record_id: record_id(project_id, &issue.key),
      project_id: project_id.to_string(),
      issue_key: issue.key.clone(),
      priority: issue.priority.clone(),
      resolution: issue.resolution.clone(),
      status: issue.status.clone(),
      created_date: issue.created_date,
      comments_count: issue.comments_count,

      earliest_affected_release: name_of(earliest_affected),
      latest_affected_release: name_of(latest_affected),
      earliest_fix_release: name_of(earliest_fix),
      latest_fix_release: name_of(latest_fix),
      closest_tracker_release: name_of(closest_tracker),
      closest_vcs_release: name_of(closest_vcs),
      tracker_start_release: name_of(tracker_start),
      vcs_start_release: name_of(vcs_start.as_ref()),
      earliest_vcs_release: name_of(earliest_vcs.as_ref()),

      tracker_distance_days: tracker_distance.days,
      tracker_distance_releases: tracker_distance.releases,
      vcs_distance_days: vcs_distance.days,
      vcs_distance_releases: vcs_distance.releases,
      fix_distance_days: fix_distance.days,
      fix_distance_releases: fix_distance.releases,

      resolver: resolution.and_then(|e| e.author.clone()),
      resolution_date,
      resolution_hours: hours_between(issue.created_date, resolution_date),
      reopen_count: history::reopen_count(&issue.change_log, self.config),
      priority_changer: priority.and_then(|e| e.author.clone()),
      priority_changed_from: priority.and_then(|e| e.from_value.clone()),
      priority_changed_to: priority.and_then(|e| e.to_value.clone()),
      priority_change_date: priority.map(|e| e.timestamp),
      priority_change_count: history::priority_change_count(&issue.change_log, self.config),

      commit_count: commits.len() as u32,
      tagged_commit_count: tag_sets.iter().filter(|s| !s.is_empty()).count() as u32,
      committer: commit_summary.committer,
      commit_repository: commit_summary.repository,
      commit_date: commit_summary.date,
      commit_resolution_hours: commit_summary.resolution_hours,
      avg_lines: commit_summary.avg_lines,
      total_insertions: commit_summary.total_insertions,
      total_deletions: commit_summary.total_deletions,
      avg_files: commit_summary.avg_files,
    }
  }
}

/// Compute one issue's record, loading the project timelines on the spot.
/// Batches should build a [`ProjectContext`] once and reuse it instead.
pub fn compute_issue_metrics<S: Store + ?Sized>(
  store: &S,
  issue: &Issue,
  project: &Project,
  config: &Config,
) -> MetricsRecord {
  ProjectContext::load(store, project, config).compute(issue)
}

/// Stable row id: hash of project + issue key.
pub fn record_id(project_id: &str, issue_key: &str) -> String {
  let mut hasher = blake3::Hasher::new();
  hasher.update(project_id.as_bytes());
  hasher.update(b"|");
  hasher.update(issue_key.as_bytes());
  let hex = hasher.finalize().to_hex();
  format!("rec-{}", &hex[..16])
}

fn name_of(release: Option<&Release>) -> Option<String> {
  release.map(|r| r.name.clone())
}

fn hours_between(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<f64> {
  Some((to? - from?).num_seconds() as f64 / 3600.0)
}

/// Aggregates over an issue's commits; everything is null without commits.
#[derive(Debug, Default, PartialEq)]
struct CommitSummary {
  committer: Option<String>,
  repository: Option<String>,
  date: Option<DateTime<Utc>>,
  resolution_hours: Option<f64>,
  avg_lines: Option<f64>,
  total_insertions: Option<u64>,
  total_deletions: Option<u64>,
  avg_files: Option<f64>,
}

impl CommitSummary {
  fn from_commits(commits: &[Commit], created: Option<DateTime<Utc>>) -> Self {
    if commits.is_empty() {
      return Self::default();
    }

    // Earliest by date, undated last, sha for determinism.
    let first = commits
      .iter()
      .min_by(|a, b| (a.date.is_none(), a.date, &a.sha).cmp(&(b.date.is_none(), b.date, &b.sha)));

    let n = commits.len() as f64;
    let lines: u64 = commits.iter().map(|c| c.stats.lines()).sum();
    let files: u64 = commits.iter().map(|c| c.stats.files).sum();

    Self {
      committer: first.and_then(|c| c.committer.clone()),
      repository: first.map(|c| c.repository.clone()),
      date: first.and_then(|c| c.date),
      resolution_hours: hours_between(created, first.and_then(|c| c.date)),
      avg_lines: Some(lines as f64 / n),
      total_insertions: Some(commits.iter().map(|c| c.stats.insertions).sum()),
      total_deletions: Some(commits.iter().map(|c| c.stats.deletions).sum()),
      avg_files: Some(files as f64 / n),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProjectConfig;
  use crate::store::{CommitTag, MemoryStore, Snapshot};
  use crate::types::{ChangeEvent, CommitStats};
  use chrono::TimeZone;

  fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
  }

  fn project() -> Project {
    Project::compile(ProjectConfig {
      project_id: "12313920".into(),
      project_key: Some("CLOUDSTACK".into()),
      release_name_pattern: r"^(\d+\.)?(\d+\.)?(\*|\d+)$".into(),
      tracker_release_pattern: None,
      repositories: vec!["cloudstack".into()],
      accepted_resolution_values: ["Fixed".to_string()].into_iter().collect(),
    })
    .unwrap()
  }

  fn release(source: Source, name: &str, date: Option<DateTime<Utc>>) -> Release {
    Release {
      project_id: "12313920".into(),
      source,
      name: name.into(),
      date,
      repository: match source {
        Source::Vcs => Some("cloudstack".into()),
        Source::Tracker => None,
      },
    }
  }

  fn commit(sha: &str, date: DateTime<Utc>, insertions: u64, deletions: u64, files: u64) -> Commit {
    Commit {
      project_id: "12313920".into(),
      repository: "cloudstack".into(),
      sha: sha.into(),
      author: Some("author".into()),
      committer: Some(format!("committer-{}", sha)),
      date: Some(date),
      stats: CommitStats {
        insertions,
        deletions,
        files,
      },
    }
  }

  fn link(sha: &str, tag: &str) -> CommitTag {
    CommitTag {
      project_id: "12313920".into(),
      repository: "cloudstack".into(),
      commit_sha: sha.into(),
      tag_name: tag.into(),
    }
  }

  fn issue() -> Issue {
    Issue {
      project_id: "12313920".into(),
      key: "CLOUDSTACK-42".into(),
      created_date: Some(ymd(2020, 1, 1)),
      priority: Some("Major".into()),
      resolution: Some("Fixed".into()),
      status: Some("Closed".into()),
      affected_versions: vec![release(Source::Tracker, "1.0", None)],
      fix_versions: vec![release(Source::Tracker, "1.2", Some(ymd(2020, 3, 1)))],
      linked_commits: vec![
        commit("bbb", ymd(2020, 1, 20), 10, 2, 3),
        commit("aaa", ymd(2020, 1, 10), 4, 4, 1),
      ],
      change_log: vec![
        ChangeEvent {
          timestamp: ymd(2020, 1, 21),
          author: Some("resolver".into()),
          field: "resolution".into(),
          from_value: None,
          to_value: Some("Fixed".into()),
        },
        ChangeEvent {
          timestamp: ymd(2020, 1, 2),
          author: Some("triager".into()),
          field: "priority".into(),
          from_value: Some("Minor".into()),
          to_value: Some("Major".into()),
        },
      ],
      comments_count: 3,
    }
  }

  fn store() -> MemoryStore {
    let mut releases = Vec::new();
    for (name, date) in [("1.0", ymd(2019, 6, 1)), ("1.1", ymd(2020, 2, 1)), ("1.2", ymd(2020, 3, 1))] {
      releases.push(release(Source::Tracker, name, Some(date)));
      releases.push(release(Source::Vcs, name, Some(date)));
    }
    MemoryStore::new(Snapshot {
      projects: vec![],
      releases,
      commit_tags: vec![link("aaa", "1.1"), link("aaa", "1.2"), link("bbb", "1.2"), link("bbb", "1.2-SNAPSHOT")],
      issues: vec![issue()],
    })
    .unwrap()
  }

  #[test]
  fn affected_date_is_hydrated_from_store() {
    let store = store();
    let project = project();
    let config = Config::default();
    let record = compute_issue_metrics(&store, &issue(), &project, &config);

    assert_eq!(record.tracker_start_release.as_deref(), Some("1.0"));
    assert_eq!(record.tracker_distance_days, Some(274));
    assert_eq!(record.tracker_distance_releases, Some(2));
  }

  #[test]
  fn vcs_side_uses_union_of_tags() {
    let store = store();
    let project = project();
    let config = Config::default();
    let record = compute_issue_metrics(&store, &issue(), &project, &config);

    assert_eq!(record.earliest_vcs_release.as_deref(), Some("1.1"));
    assert_eq!(record.vcs_start_release.as_deref(), Some("1.0"));
    assert_eq!(record.vcs_distance_days, Some(245));
    assert_eq!(record.vcs_distance_releases, Some(1));
    assert_eq!(record.fix_distance_days, Some(245));
    assert_eq!(record.fix_distance_releases, Some(1));
    assert_eq!(record.commit_count, 2);
    assert_eq!(record.tagged_commit_count, 2);
  }

  #[test]
  fn history_and_commit_aggregates() {
    let store = store();
    let project = project();
    let config = Config::default();
    let record = compute_issue_metrics(&store, &issue(), &project, &config);

    assert_eq!(record.resolver.as_deref(), Some("resolver"));
    assert_eq!(record.resolution_hours, Some(480.0));
    assert_eq!(record.priority_changed_to.as_deref(), Some("Major"));
    assert_eq!(record.priority_change_count, 1);
    assert_eq!(record.reopen_count, 0);

    assert_eq!(record.committer.as_deref(), Some("committer-aaa"));
    assert_eq!(record.commit_resolution_hours, Some(216.0));
    assert_eq!(record.avg_lines, Some(10.0));
    assert_eq!(record.total_insertions, Some(14));
    assert_eq!(record.total_deletions, Some(6));
    assert_eq!(record.avg_files, Some(2.0));
  }

  #[test]
  fn bare_issue_still_yields_a_record() {
    let store = MemoryStore::new(Snapshot::default()).unwrap();
    let project = project();
    let bare = Issue {
      project_id: "12313920".into(),
      key: "CLOUDSTACK-7".into(),
      created_date: None,
      priority: None,
      resolution: None,
      status: None,
      affected_versions: vec![],
      fix_versions: vec![],
      linked_commits: vec![],
      change_log: vec![],
      comments_count: 0,
    };
    let record = compute_issue_metrics(&store, &bare, &project, &Config::default());

    assert_eq!(record.issue_key, "CLOUDSTACK-7");
    assert!(record.fix_distance_days.is_none());
    assert!(record.fix_distance_releases.is_none());
    assert!(record.earliest_vcs_release.is_none());
    assert!(record.avg_lines.is_none());
    assert_eq!(record.commit_count, 0);
  }

  #[test]
  fn commits_carried_on_the_issue_are_used_without_a_store_entry() {
    let mut releases = Vec::new();
    for (name, date) in [("1.0", ymd(2019, 6, 1)), ("1.1", ymd(2020, 2, 1))] {
      releases.push(release(Source::Vcs, name, Some(date)));
    }
    // The store knows the tags but not the issue itself.
    let store = MemoryStore::new(Snapshot {
      releases,
      commit_tags: vec![link("aaa", "1.1")],
      ..Snapshot::default()
    })
    .unwrap();

    let record = compute_issue_metrics(&store, &issue(), &project(), &Config::default());
    assert_eq!(record.commit_count, 2);
    assert_eq!(record.tagged_commit_count, 1);
    assert_eq!(record.earliest_vcs_release.as_deref(), Some("1.1"));
    assert_eq!(record.committer.as_deref(), Some("committer-aaa"));
  }

  #[test]
  fn store_commits_fill_in_for_an_issue_carrying_none() {
    let store = store();
    let mut bare = issue();
    bare.linked_commits.clear();
    let record = compute_issue_metrics(&store, &bare, &project(), &Config::default());
    assert_eq!(record.commit_count, 2);
    assert_eq!(record.earliest_vcs_release.as_deref(), Some("1.1"));
  }

  #[test]
  fn hours_keep_full_precision() {
    let from = ymd(2020, 1, 1);
    let to = from + chrono::Duration::minutes(20);
    let hours = hours_between(Some(from), Some(to)).unwrap();
    assert!((hours - 1.0 / 3.0).abs() < 1e-12);
    assert_ne!(hours, 0.33);
    assert!(hours_between(None, Some(to)).is_none());
  }

  #[test]
  fn closest_release_is_the_fallback_start() {
    let store = store();
    let project = project();
    let mut no_affected = issue();
    no_affected.affected_versions.clear();
    let record = compute_issue_metrics(&store, &no_affected, &project, &Config::default());

    assert_eq!(record.closest_tracker_release.as_deref(), Some("1.1"));
    assert_eq!(record.tracker_start_release.as_deref(), Some("1.1"));
    assert_eq!(record.tracker_distance_days, Some(29));
    assert_eq!(record.vcs_start_release.as_deref(), Some("1.1"));
    assert_eq!(record.vcs_distance_days, Some(0));
    assert_eq!(record.fix_distance_days, Some(0));
  }

  #[test]
  fn record_id_is_stable() {
    let a = record_id("12313920", "CLOUDSTACK-42");
    assert_eq!(a, record_id("12313920", "CLOUDSTACK-42"));
    assert_ne!(a, record_id("12313920", "CLOUDSTACK-43"));
    assert!(a.starts_with("rec-"));
    assert_eq!(a.len(), 20);
  }
}
